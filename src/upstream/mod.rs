//! Upstream image-transformation capability.
//!
//! # Data Flow
//! ```text
//! SourceDescriptor
//!     → TransformDirectives (width, height, quality?, format?, cache key)
//!     → Transformer::transform (client.rs talks HTTP to the service)
//!     → UpstreamImage { bytes, content_type }
//!     → classify.rs decides passthrough vs transformed
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees the [`Transformer`] trait; tests swap in fakes
//! - Transport and status failures share one error type and are never retried

pub mod classify;
pub mod client;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::Serialize;
use url::Url;

use crate::pipeline::negotiate::OutputFormat;

pub use classify::{ImageKind, MediaPolicy};
pub use client::HttpTransformer;

/// Instructions for a single transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformDirectives {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    /// Scopes the upstream's own cache. Unrelated to the edge cache key.
    pub cache_key: String,
}

impl TransformDirectives {
    /// Partition key for `source`: its path, or the whole URL when the path is empty.
    pub fn partition_key(source: &Url) -> String {
        match source.path() {
            "" => source.to_string(),
            path => path.to_string(),
        }
    }
}

/// Body and reported media type of a successful upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Why an upstream call produced no image.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream body exceeded {0} bytes")]
    TooLarge(u64),
}

/// Anything that can turn a source URL plus directives into image bytes.
#[async_trait]
pub trait Transformer: Send + Sync + 'static {
    async fn transform(
        &self,
        source: &Url,
        directives: &TransformDirectives,
    ) -> Result<UpstreamImage, UpstreamError>;
}
