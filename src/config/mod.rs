//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → PipelineSettings shared via ArcSwap with request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in new PipelineSettings
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the `[pipeline]` section is applied on reload; listener, upstream,
//!   cache and `pipeline.passthrough_types` need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    CacheConfig, ListenerConfig, LogFormat, ObservabilityConfig, PipelineConfig, ProxyConfig,
    QualityConfig, UpstreamConfig,
};
