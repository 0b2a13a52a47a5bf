//! Passthrough classification of upstream results.

/// What the pipeline does with an upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Vector or animated; the upstream returns the original bytes.
    Passthrough,
    /// Raster output of the transform.
    Transformed,
}

/// Table of media types that are never raster-transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    passthrough: Vec<String>,
}

impl MediaPolicy {
    pub fn new<I, S>(passthrough: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            passthrough: passthrough
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Classify by reported `Content-Type`. Parameters (`; charset=…`) and
    /// case are ignored. A missing type is treated as transformed output.
    pub fn classify(&self, content_type: Option<&str>) -> ImageKind {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match essence {
            Some(ct) if self.passthrough.contains(&ct) => ImageKind::Passthrough,
            _ => ImageKind::Transformed,
        }
    }
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self::new(["image/svg+xml", "image/gif"])
    }
}
