//! Pipeline error taxonomy.
//!
//! Every variant is terminal: the request ends in the response produced by
//! [`ProxyError::into_response`]. Nothing is retried and no partial result
//! is served.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::upstream::UpstreamError;

/// Errors that end an image request early.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The `url` query parameter was not supplied.
    #[error("url parameter missing")]
    MissingParameter,

    /// The `url` query parameter did not resolve to an absolute http(s) URL.
    #[error("invalid source url: {0}")]
    InvalidUrl(String),

    /// Neither `w` nor `h` carried a usable value.
    #[error("width or height not supplied")]
    MissingDimensions,

    /// The upstream transform fetch failed in any way.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),
}

impl ProxyError {
    /// Status code surfaced to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter
            | ProxyError::InvalidUrl(_)
            | ProxyError::MissingDimensions => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnavailable(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Plain-text body surfaced to the caller.
    ///
    /// A missing and an invalid `url` share one message, and every upstream
    /// failure reads as a missing image.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::MissingParameter | ProxyError::InvalidUrl(_) => "url is required",
            ProxyError::MissingDimensions => "Width or height not supplied",
            ProxyError::UpstreamUnavailable(_) => "image not found",
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingParameter => "missing_parameter",
            ProxyError::InvalidUrl(_) => "invalid_url",
            ProxyError::MissingDimensions => "missing_dimensions",
            ProxyError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
