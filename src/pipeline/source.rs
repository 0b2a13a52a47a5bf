//! Source URL resolution.

use url::Url;

use crate::config::validation::parse_http_url;
use crate::error::ProxyError;

/// Resolve the caller's `url` parameter into an absolute http(s) URL.
///
/// Path-absolute values are joined onto `fallback_origin` by plain string
/// concatenation, so the origin's own path (if any) is kept as a prefix.
pub fn resolve_source(raw: Option<&str>, fallback_origin: &Url) -> Result<Url, ProxyError> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or(ProxyError::MissingParameter)?;

    let candidate = if raw.starts_with('/') {
        format!("{}{}", fallback_origin.as_str().trim_end_matches('/'), raw)
    } else {
        raw.to_string()
    };

    parse_http_url(&candidate).map_err(|reason| {
        tracing::debug!(url = %candidate, %reason, "Rejected source url");
        ProxyError::InvalidUrl(candidate)
    })
}
