//! HTTP client for the transform service.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{TransformDirectives, Transformer, UpstreamError, UpstreamImage};
use crate::config::UpstreamConfig;
use crate::config::validation::parse_http_url;

/// Calls `GET {endpoint}?url=…&width=…&height=…[&quality=…][&format=…]&cache_key=…`.
#[derive(Debug, Clone)]
pub struct HttpTransformer {
    client: reqwest::Client,
    endpoint: Url,
    max_body_bytes: u64,
    timeout: Option<Duration>,
}

impl HttpTransformer {
    pub fn new(endpoint: Url, max_body_bytes: u64) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint, max_body_bytes)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url, max_body_bytes: u64) -> Self {
        Self {
            client,
            endpoint,
            max_body_bytes,
            timeout: None,
        }
    }

    /// Build from `[upstream]`. Fails only on an unusable endpoint.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, String> {
        let endpoint = parse_http_url(&config.endpoint)?;
        let transformer = Self::new(endpoint, config.max_body_bytes);
        Ok(match config.timeout_secs {
            Some(secs) => transformer.with_timeout(Duration::from_secs(secs)),
            None => transformer,
        })
    }

    /// Bound each call, from connect until the body is read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transformer for HttpTransformer {
    async fn transform(
        &self,
        source: &Url,
        directives: &TransformDirectives,
    ) -> Result<UpstreamImage, UpstreamError> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(&[("url", source.as_str())])
            .query(directives);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let mut response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes)
        {
            return Err(UpstreamError::TooLarge(self.max_body_bytes));
        }

        // Stream so an oversized body is rejected without buffering all of it.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(UpstreamError::TooLarge(self.max_body_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(UpstreamImage {
            bytes: Bytes::from(body),
            content_type,
        })
    }
}
