//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every URL-shaped setting parses as an absolute http(s) URL
//! - Validate value ranges (limits > 0, quality within 1..=100)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Parse `raw` as an absolute http(s) URL with a host.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be > 0"));
    }
    if let Some(origin) = &config.listener.public_origin {
        if let Err(e) = parse_http_url(origin) {
            errors.push(ValidationError::new("listener.public_origin", e));
        }
    }

    if let Err(e) = parse_http_url(&config.upstream.endpoint) {
        errors.push(ValidationError::new("upstream.endpoint", e));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be > 0"));
    }
    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::new("upstream.timeout_secs", "must be > 0"));
    }

    if config.cache.max_entries == 0 {
        errors.push(ValidationError::new("cache.max_entries", "must be > 0"));
    }
    if config.cache.max_bytes == 0 {
        errors.push(ValidationError::new("cache.max_bytes", "must be > 0"));
    }

    if let Err(e) = parse_http_url(&config.pipeline.fallback_origin) {
        errors.push(ValidationError::new("pipeline.fallback_origin", e));
    }
    if let Some(q) = config.pipeline.quality.default {
        if !(1..=100).contains(&q) {
            errors.push(ValidationError::new(
                "pipeline.quality.default",
                format!("{} is outside 1..=100", q),
            ));
        }
    }
    for media_type in &config.pipeline.passthrough_types {
        if !media_type.contains('/') || media_type.trim() != media_type {
            errors.push(ValidationError::new(
                "pipeline.passthrough_types",
                format!("'{}' is not a media type", media_type),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
