//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::pipeline::negotiate::NegotiationMode;

/// Root configuration for the image proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, concurrency cap).
    pub listener: ListenerConfig,

    /// Upstream transform service.
    pub upstream: UpstreamConfig,

    /// Request normalization policy. Hot-reloadable.
    pub pipeline: PipelineConfig,

    /// Edge cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests served concurrently (backpressure).
    pub max_connections: usize,

    /// Scheme and host this proxy is reached at, e.g. "https://img.example.com".
    ///
    /// Used to rebuild the inbound URL for cache keys. When unset the `Host`
    /// header is used with an `http` scheme.
    pub public_origin: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            public_origin: None,
        }
    }
}

/// Upstream image-transformation service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the transform endpoint. Directives are sent as query parameters.
    pub endpoint: String,

    /// Largest upstream body accepted, in bytes.
    pub max_body_bytes: u64,

    /// Deadline for one transform call, body included. Unset leaves the
    /// HTTP client's defaults in place. An expired call counts as an
    /// upstream failure.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787/transform".to_string(),
            max_body_bytes: 25 * 1024 * 1024, // 25 MiB
            timeout_secs: None,
        }
    }
}

/// Request normalization policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Origin prepended to path-absolute `url` parameters.
    pub fallback_origin: String,

    /// How the `Accept` header maps to an output format.
    pub negotiation: NegotiationMode,

    /// Quality defaulting and clamping.
    pub quality: QualityConfig,

    /// Media types served untransformed (vector and animated formats).
    pub passthrough_types: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_origin: "https://images.example.com".to_string(),
            negotiation: NegotiationMode::default(),
            quality: QualityConfig::default(),
            passthrough_types: vec!["image/svg+xml".to_string(), "image/gif".to_string()],
        }
    }
}

/// Quality policy. Both knobs are off by default so `q` passes through as sent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct QualityConfig {
    /// Quality used when the request carries no `q`.
    pub default: Option<u32>,

    /// Clamp supplied quality into 1..=100.
    pub clamp: bool,
}

/// Edge cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every lookup misses and nothing is stored.
    pub enabled: bool,

    /// Most responses the in-memory cache holds.
    pub max_entries: usize,

    /// Most body bytes the in-memory cache holds.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            max_bytes: 256 * 1024 * 1024, // 256 MiB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.pipeline.passthrough_types.len(), 2);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 10_000);
        assert_eq!(config.upstream.timeout_secs, None);
        assert_eq!(config.pipeline.quality.default, None);
        assert!(!config.pipeline.quality.clamp);
    }

    #[test]
    fn test_partial_sections() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [pipeline]
            fallback_origin = "https://cdn.shop.test"
            negotiation = "webp_flag"

            [pipeline.quality]
            default = 75

            [upstream]
            timeout_secs = 5

            [cache]
            max_bytes = 1048576

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.fallback_origin, "https://cdn.shop.test");
        assert_eq!(config.pipeline.negotiation, NegotiationMode::WebpFlag);
        assert_eq!(config.pipeline.quality.default, Some(75));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.upstream.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.upstream.timeout_secs, Some(5));
        assert_eq!(config.cache.max_bytes, 1024 * 1024);
        assert_eq!(config.cache.max_entries, 10_000);
    }
}
