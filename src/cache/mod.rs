//! Edge cache subsystem.
//!
//! # Data Flow
//! ```text
//! CacheKey
//!     → gateway.rs lookup  → hit: stored response returned verbatim
//!                          → miss: pipeline continues upstream
//! Assembled response
//!     → gateway.rs store_detached → tokio task → EdgeCache::store
//! ```
//!
//! # Design Decisions
//! - The backing store is opaque behind [`EdgeCache`]; expiry is its concern
//! - Stored responses carry an immutable Cache-Control and are never revalidated
//! - Writes are last-write-wins; every write for a key carries the same bytes

pub mod gateway;
pub mod memory;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::pipeline::CacheKey;

pub use gateway::CacheGateway;
pub use memory::MemoryCache;

/// A fully assembled response as kept in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Failure reported by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend rejected entry: {0}")]
    Rejected(String),
}

/// External key-value store holding assembled responses.
#[async_trait]
pub trait EdgeCache: Send + Sync + 'static {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    async fn store(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError>;
}
