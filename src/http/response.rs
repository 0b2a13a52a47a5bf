//! Response assembly.
//!
//! # Responsibilities
//! - Turn an upstream image into the response served and cached
//! - Stamp the immutable caching policy on every image response
//! - Add a `Date` header to transformed output only
//!
//! # Design Decisions
//! - The body is a shared `Bytes`; the cached copy and the served copy
//!   point at the same payload
//! - The clock is passed in so assembly is deterministic under test

use axum::http::{
    header::{CACHE_CONTROL, CONTENT_TYPE, DATE},
    HeaderMap, HeaderValue, StatusCode,
};
use chrono::{DateTime, Utc};

use crate::cache::CachedResponse;
use crate::upstream::{ImageKind, UpstreamImage};

/// Caching policy baked into every stored image.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Content type used when the upstream does not report a usable one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the final response for an upstream image.
pub fn assemble(image: UpstreamImage, kind: ImageKind, now: DateTime<Utc>) -> CachedResponse {
    let mut headers = HeaderMap::new();

    let content_type = image
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL));

    if kind == ImageKind::Transformed {
        if let Ok(date) = HeaderValue::from_str(&http_date(now)) {
            headers.insert(DATE, date);
        }
    }

    CachedResponse {
        status: StatusCode::OK,
        headers,
        body: image.bytes,
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
