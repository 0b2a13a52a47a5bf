//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the image and health handlers
//! - Wire up middleware (tracing, concurrency cap, request ID)
//! - Build the default collaborators (HTTP transformer, in-memory cache)
//! - Apply pipeline settings pushed by the config watcher
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::ACCEPT, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;
use url::Url;

use crate::cache::{CacheGateway, EdgeCache, MemoryCache};
use crate::config::loader::ConfigError;
use crate::config::validation::{parse_http_url, ValidationError};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{inbound_url, request_id, UuidRequestId};
use crate::pipeline::{ImagePipeline, PipelineSettings};
use crate::upstream::{HttpTransformer, Transformer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ImagePipeline,
    pub public_origin: Option<Url>,
}

/// HTTP server for the image proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pipeline: ImagePipeline,
}

impl HttpServer {
    /// Create a server with the HTTP transformer and a bounded in-memory cache.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let transformer = HttpTransformer::from_config(&config.upstream)
            .map_err(|message| invalid("upstream.endpoint", message))?;
        let cache = MemoryCache::from_config(&config.cache);
        Self::with_collaborators(config, Arc::new(cache), Arc::new(transformer))
    }

    /// Create a server over caller-supplied collaborators.
    pub fn with_collaborators(
        config: ProxyConfig,
        cache: Arc<dyn EdgeCache>,
        transformer: Arc<dyn Transformer>,
    ) -> Result<Self, ConfigError> {
        let settings = PipelineSettings::from_config(&config.pipeline)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let public_origin = config
            .listener
            .public_origin
            .as_deref()
            .map(parse_http_url)
            .transpose()
            .map_err(|message| invalid("listener.public_origin", message))?;

        let gateway = CacheGateway::new(cache, config.cache.enabled);
        let pipeline = ImagePipeline::new(settings, gateway, transformer);

        let state = AppState {
            pipeline: pipeline.clone(),
            public_origin,
        };
        let router = Self::build_router(&config, state);

        Ok(Self {
            router,
            config,
            pipeline,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// There is no request deadline here; a slow upstream is bounded by
    /// `upstream.timeout_secs` and surfaces as a 404 like any other failure.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .route("/", get(image_handler))
            .route("/{*path}", get(image_handler))
            .with_state(state)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the pipeline
    /// settings for subsequent requests. The passthrough table is kept from
    /// startup: it decides response headers, which cache keys do not cover.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let pipeline = self.pipeline.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match PipelineSettings::from_config(&config.pipeline) {
                    Ok(mut settings) => {
                        let current = pipeline.settings();
                        if settings.media != current.media {
                            tracing::warn!(
                                "pipeline.passthrough_types changed; restart to apply"
                            );
                        }
                        settings.media = current.media.clone();
                        tracing::info!(
                            fallback_origin = %settings.fallback_origin,
                            negotiation = ?settings.negotiation,
                            "Pipeline settings reloaded"
                        );
                        pipeline.update_settings(settings);
                    }
                    Err(e) => tracing::error!(error = %e, "Ignoring invalid pipeline settings"),
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The pipeline shared by all handlers.
    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    /// The fully layered router, for embedding or driving without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

fn invalid(field: &'static str, message: String) -> ConfigError {
    ConfigError::Validation(vec![ValidationError { field, message }])
}

/// Image handler. Every path is served; only the query string matters.
///
/// Passthrough responses are assembled and cached without a `Date` header.
/// hyper still stamps its own `Date` on every response it writes, so clients
/// see one on the wire.
async fn image_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let span = tracing::info_span!("image_request", request_id = %request_id(&headers));

    let inbound = match inbound_url(&uri, &headers, state.public_origin.as_ref()) {
        Ok(url) => url,
        Err(e) => return ProxyError::InvalidUrl(e.to_string()).into_response(),
    };
    let accept = headers.get(ACCEPT).and_then(|v| v.to_str().ok());

    state.pipeline.handle(&inbound, accept).instrument(span).await
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.pipeline.fallback_origin = "https://assets.shop.test".into();
        HttpServer::new(config).unwrap()
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = server()
            .router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_missing_url() {
        assert_eq!(
            get("/?w=100").await,
            (StatusCode::BAD_REQUEST, "url is required".to_string())
        );
        assert_eq!(
            get("/any/path?url=relative.png&w=100").await,
            (StatusCode::BAD_REQUEST, "url is required".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_dimensions() {
        assert_eq!(
            get("/?url=%2Fa.png&w=zero").await,
            (StatusCode::BAD_REQUEST, "Width or height not supplied".to_string())
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = server()
            .router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let mut config = ProxyConfig::default();
        config.upstream.endpoint = "not a url".into();
        assert!(matches!(
            HttpServer::new(config),
            Err(ConfigError::Validation(_))
        ));
    }
}
