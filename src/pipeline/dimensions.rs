//! Width/height reconciliation and quality policy.

use crate::config::QualityConfig;
use crate::error::ProxyError;
use crate::pipeline::params::parse_leading_int;

/// Resolved output box. Both sides are always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reconcile raw `w` and `h`.
///
/// Zero and unparseable values count as absent. A single supplied side is
/// mirrored onto the other, so the request is treated as square.
pub fn resolve_dimensions(
    width: Option<&str>,
    height: Option<&str>,
) -> Result<Dimensions, ProxyError> {
    let width = width.and_then(parse_leading_int).filter(|&v| v > 0);
    let height = height.and_then(parse_leading_int).filter(|&v| v > 0);

    match (width, height) {
        (Some(width), Some(height)) => Ok(Dimensions { width, height }),
        (Some(side), None) | (None, Some(side)) => Ok(Dimensions {
            width: side,
            height: side,
        }),
        (None, None) => Err(ProxyError::MissingDimensions),
    }
}

/// Apply the configured quality policy to the raw `q` value.
pub fn resolve_quality(raw: Option<&str>, policy: &QualityConfig) -> Option<u32> {
    let quality = raw.and_then(parse_leading_int).or(policy.default)?;
    if policy.clamp {
        Some(quality.clamp(1, 100))
    } else {
        Some(quality)
    }
}
