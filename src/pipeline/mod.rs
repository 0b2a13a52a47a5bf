//! Request normalization and response pipeline.
//!
//! # Data Flow
//! ```text
//! inbound URL + Accept
//!     → negotiate.rs   (format preference)
//!     → source.rs      (absolute source URL)
//!     → dimensions.rs  (width/height, quality)
//!     → cache_key.rs   (edge cache key)
//!     → cache gateway  → hit: return stored response
//!     → transformer    (upstream fetch with directives)
//!     → classify + assemble → detached cache store → response
//! ```
//!
//! # Design Decisions
//! - One forward pass per request; no step looks at a later one
//! - Every path ends in a response; errors map through [`ProxyError`]
//! - Settings are read from an `ArcSwap` snapshot so reloads never block requests

pub mod cache_key;
pub mod dimensions;
pub mod negotiate;
pub mod params;
pub mod source;

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use url::Url;

use crate::cache::{CacheGateway, CachedResponse};
use crate::config::validation::{parse_http_url, ValidationError};
use crate::config::{PipelineConfig, QualityConfig};
use crate::error::ProxyError;
use crate::http::response::assemble;
use crate::observability::metrics;
use crate::upstream::{
    ImageKind, MediaPolicy, TransformDirectives, Transformer, UpstreamImage,
};

pub use cache_key::CacheKey;
pub use dimensions::Dimensions;
pub use negotiate::{FormatPreference, NegotiationMode, OutputFormat};

use self::params::ImageQuery;

/// Parsed, ready-to-use form of [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub fallback_origin: Url,
    pub negotiation: NegotiationMode,
    pub quality: QualityConfig,
    pub media: MediaPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ValidationError> {
        let fallback_origin =
            parse_http_url(&config.fallback_origin).map_err(|message| ValidationError {
                field: "pipeline.fallback_origin",
                message,
            })?;
        Ok(Self {
            fallback_origin,
            negotiation: config.negotiation,
            quality: config.quality.clone(),
            media: MediaPolicy::new(&config.passthrough_types),
        })
    }
}

/// Everything the transform needs about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub absolute_url: Url,
    pub dimensions: Dimensions,
    pub quality: Option<u32>,
    pub format: FormatPreference,
}

impl SourceDescriptor {
    pub fn directives(&self) -> TransformDirectives {
        TransformDirectives {
            width: self.dimensions.width,
            height: self.dimensions.height,
            quality: self.quality,
            format: self.format.format_hint(),
            cache_key: TransformDirectives::partition_key(&self.absolute_url),
        }
    }
}

/// A validated request and the key its response is cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub descriptor: SourceDescriptor,
    pub cache_key: CacheKey,
}

/// Run the pure normalization steps: negotiate, resolve, reconcile, key.
pub fn prepare(
    settings: &PipelineSettings,
    inbound: &Url,
    accept: Option<&str>,
) -> Result<PreparedRequest, ProxyError> {
    let format = negotiate::negotiate(accept, settings.negotiation);
    let query = ImageQuery::parse(inbound.query());

    let absolute_url = source::resolve_source(query.url.as_deref(), &settings.fallback_origin)?;
    let dimensions =
        dimensions::resolve_dimensions(query.width.as_deref(), query.height.as_deref())?;
    let quality = dimensions::resolve_quality(query.quality.as_deref(), &settings.quality);

    let descriptor = SourceDescriptor {
        absolute_url,
        dimensions,
        quality,
        format,
    };
    let cache_key = CacheKey::for_request(inbound, &descriptor);
    Ok(PreparedRequest {
        descriptor,
        cache_key,
    })
}

/// How a successful request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CacheHit,
    Passthrough,
    Transformed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CacheHit => "cache_hit",
            Outcome::Passthrough => "passthrough",
            Outcome::Transformed => "transformed",
        }
    }
}

/// The image request pipeline shared by all handlers.
#[derive(Clone)]
pub struct ImagePipeline {
    settings: Arc<ArcSwap<PipelineSettings>>,
    cache: CacheGateway,
    transformer: Arc<dyn Transformer>,
}

impl ImagePipeline {
    pub fn new(
        settings: PipelineSettings,
        cache: CacheGateway,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            cache,
            transformer,
        }
    }

    /// Replace the settings used by requests that start after this call.
    pub fn update_settings(&self, settings: PipelineSettings) {
        self.settings.store(Arc::new(settings));
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<PipelineSettings> {
        self.settings.load_full()
    }

    /// Serve one image request. Never fails; errors become their HTTP response.
    pub async fn handle(&self, inbound: &Url, accept: Option<&str>) -> Response {
        let start = Instant::now();
        match self.serve(inbound, accept).await {
            Ok((response, outcome)) => {
                tracing::debug!(outcome = outcome.as_str(), "Image served");
                metrics::record_request(response.status.as_u16(), outcome.as_str(), start);
                response.into_response()
            }
            Err(err) => {
                match &err {
                    ProxyError::UpstreamUnavailable(cause) => {
                        tracing::warn!(error = %cause, "Upstream transform failed")
                    }
                    other => tracing::debug!(error = %other, "Rejected image request"),
                }
                metrics::record_request(err.status().as_u16(), err.kind(), start);
                err.into_response()
            }
        }
    }

    /// Steps 1–7, returning the response to serve.
    pub async fn serve(
        &self,
        inbound: &Url,
        accept: Option<&str>,
    ) -> Result<(CachedResponse, Outcome), ProxyError> {
        let settings = self.settings.load_full();
        let PreparedRequest {
            descriptor,
            cache_key,
        } = prepare(&settings, inbound, accept)?;

        if let Some(hit) = self.cache.lookup(&cache_key).await {
            tracing::debug!(cache_key = %cache_key, "Cache hit");
            return Ok((hit, Outcome::CacheHit));
        }

        let image = self.fetch(&descriptor).await?;
        let kind = settings.media.classify(image.content_type.as_deref());
        let response = assemble(image, kind, Utc::now());

        self.cache.store_detached(cache_key, response.clone());

        let outcome = match kind {
            ImageKind::Passthrough => Outcome::Passthrough,
            ImageKind::Transformed => Outcome::Transformed,
        };
        Ok((response, outcome))
    }

    async fn fetch(&self, descriptor: &SourceDescriptor) -> Result<UpstreamImage, ProxyError> {
        let directives = descriptor.directives();
        tracing::debug!(
            source = %descriptor.absolute_url,
            width = directives.width,
            height = directives.height,
            quality = ?directives.quality,
            format = ?directives.format,
            "Requesting transform"
        );
        match self
            .transformer
            .transform(&descriptor.absolute_url, &directives)
            .await
        {
            Ok(image) => {
                metrics::record_upstream("ok");
                Ok(image)
            }
            Err(e) => {
                metrics::record_upstream("error");
                Err(e.into())
            }
        }
    }
}
