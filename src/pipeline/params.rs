//! Recognized query parameters of an image request.

use url::form_urlencoded;

/// Raw `url`, `w`, `h` and `q` values. The first occurrence of each wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageQuery {
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub quality: Option<String>,
}

impl ImageQuery {
    /// Extract recognized parameters from a raw (still percent-encoded) query string.
    pub fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        let Some(query) = query else {
            return parsed;
        };

        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*name {
                "url" => &mut parsed.url,
                "w" => &mut parsed.width,
                "h" => &mut parsed.height,
                "q" => &mut parsed.quality,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        parsed
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then the
/// longest run of digits. Anything else yields `None`, as does a value that
/// overflows or is negative.
pub fn parse_leading_int(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end].parse().ok()
}
