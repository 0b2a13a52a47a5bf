//! Edge image proxy.
//!
//! Fetches a source image through an upstream transformation service,
//! resized and re-encoded for the client's `Accept` header, and serves it
//! with immutable cache headers from an edge cache keyed on the normalized
//! request.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::ImagePipeline;
