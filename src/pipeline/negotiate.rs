//! Output format negotiation from the `Accept` header.

use serde::{Deserialize, Serialize};

/// Output format hint forwarded to the transform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Let the upstream pick.
    Auto,
    Webp,
    Avif,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Auto => "auto",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

/// How `Accept` is reduced to a [`FormatPreference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationMode {
    /// Prefer AVIF, then WebP, else let the upstream decide.
    #[default]
    Negotiated,
    /// Only record whether the client accepts WebP.
    WebpFlag,
}

/// The client's acceptable output, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatPreference {
    AcceptsWebp(bool),
    Format(OutputFormat),
}

impl FormatPreference {
    /// Query parameter appended to the cache key.
    pub fn cache_key_param(&self) -> (&'static str, &'static str) {
        match self {
            FormatPreference::AcceptsWebp(true) => ("webp", "true"),
            FormatPreference::AcceptsWebp(false) => ("webp", "false"),
            FormatPreference::Format(format) => ("format", format.as_str()),
        }
    }

    /// Format directive sent upstream, if any.
    pub fn format_hint(&self) -> Option<OutputFormat> {
        match self {
            FormatPreference::AcceptsWebp(true) => Some(OutputFormat::Webp),
            FormatPreference::AcceptsWebp(false) => None,
            FormatPreference::Format(format) => Some(*format),
        }
    }
}

/// Derive the format preference from a raw `Accept` value.
///
/// A missing header means the client takes anything, so WebP is assumed.
/// A header that is present but names no image type falls back to the
/// most conservative answer for the mode.
pub fn negotiate(accept: Option<&str>, mode: NegotiationMode) -> FormatPreference {
    let Some(accept) = accept else {
        return match mode {
            NegotiationMode::WebpFlag => FormatPreference::AcceptsWebp(true),
            NegotiationMode::Negotiated => FormatPreference::Format(OutputFormat::Webp),
        };
    };

    let ranges: Vec<String> = accepted_ranges(accept).collect();
    let has = |range: &str| ranges.iter().any(|r| r == range);
    let webp = has("image/webp") || has("image/*") || has("*/*");

    match mode {
        NegotiationMode::WebpFlag => FormatPreference::AcceptsWebp(webp),
        NegotiationMode::Negotiated if has("image/avif") => {
            FormatPreference::Format(OutputFormat::Avif)
        }
        NegotiationMode::Negotiated if webp => FormatPreference::Format(OutputFormat::Webp),
        NegotiationMode::Negotiated => FormatPreference::Format(OutputFormat::Auto),
    }
}

/// Media ranges the client accepts, lowercased and stripped of parameters.
/// Ranges weighted `q=0` are refused by the client and skipped.
fn accepted_ranges(accept: &str) -> impl Iterator<Item = String> + '_ {
    accept.split(',').filter_map(|token| {
        let mut parts = token.split(';').map(str::trim);
        let range = parts.next()?.to_ascii_lowercase();
        if range.is_empty() {
            return None;
        }
        let refused = parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        (!refused).then_some(range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

    #[test]
    fn test_missing_header_accepts_webp() {
        assert_eq!(
            negotiate(None, NegotiationMode::WebpFlag),
            FormatPreference::AcceptsWebp(true)
        );
        assert_eq!(
            negotiate(None, NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Webp)
        );
    }

    #[test]
    fn test_negotiated_prefers_avif_then_webp() {
        assert_eq!(
            negotiate(Some(CHROME), NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Avif)
        );
        assert_eq!(
            negotiate(Some("image/webp, image/png"), NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Webp)
        );
        assert_eq!(
            negotiate(Some("image/png,image/jpeg"), NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Auto)
        );
    }

    #[test]
    fn test_flag_mode_wildcards() {
        assert_eq!(
            negotiate(Some("text/html, */*"), NegotiationMode::WebpFlag),
            FormatPreference::AcceptsWebp(true)
        );
        assert_eq!(
            negotiate(Some("image/*"), NegotiationMode::WebpFlag),
            FormatPreference::AcceptsWebp(true)
        );
        assert_eq!(
            negotiate(Some("image/png"), NegotiationMode::WebpFlag),
            FormatPreference::AcceptsWebp(false)
        );
        assert_eq!(
            negotiate(Some(""), NegotiationMode::WebpFlag),
            FormatPreference::AcceptsWebp(false)
        );
    }

    #[test]
    fn test_parameters_and_case() {
        assert_eq!(
            negotiate(Some("IMAGE/AVIF;q=0.9"), NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Avif)
        );
        assert_eq!(
            negotiate(Some("image/avif;q=0, image/webp"), NegotiationMode::Negotiated),
            FormatPreference::Format(OutputFormat::Webp)
        );
    }

    #[test]
    fn test_cache_key_params() {
        assert_eq!(
            FormatPreference::AcceptsWebp(false).cache_key_param(),
            ("webp", "false")
        );
        assert_eq!(
            FormatPreference::Format(OutputFormat::Avif).cache_key_param(),
            ("format", "avif")
        );
        assert_eq!(FormatPreference::AcceptsWebp(false).format_hint(), None);
    }
}
