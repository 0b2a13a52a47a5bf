//! Cache access on the request path.

use std::sync::Arc;

use super::{CachedResponse, EdgeCache};
use crate::observability::metrics;
use crate::pipeline::CacheKey;

/// Lookup and fire-and-forget store over an [`EdgeCache`].
#[derive(Clone)]
pub struct CacheGateway {
    cache: Arc<dyn EdgeCache>,
    enabled: bool,
}

impl CacheGateway {
    pub fn new(cache: Arc<dyn EdgeCache>, enabled: bool) -> Self {
        Self { cache, enabled }
    }

    /// Return the stored response for `key`, if any.
    ///
    /// A backend error is logged and reported as a miss.
    pub async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        if !self.enabled {
            return None;
        }
        match self.cache.lookup(key).await {
            Ok(Some(hit)) => {
                metrics::record_cache_lookup("hit");
                Some(hit)
            }
            Ok(None) => {
                metrics::record_cache_lookup("miss");
                None
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache lookup failed; treating as miss");
                metrics::record_cache_lookup("error");
                None
            }
        }
    }

    /// Store `response` under `key` on a detached task.
    ///
    /// The caller gets no handle and no result; failures are logged and dropped.
    pub fn store_detached(&self, key: CacheKey, response: CachedResponse) {
        if !self.enabled {
            return;
        }
        let cache = self.cache.clone();
        tokio::spawn(async move {
            match cache.store(key.clone(), response).await {
                Ok(()) => {
                    tracing::debug!(cache_key = %key, "Cached response stored");
                    metrics::record_cache_store("ok");
                }
                Err(e) => {
                    tracing::warn!(cache_key = %key, error = %e, "Cache store failed");
                    metrics::record_cache_store("error");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::pipeline::negotiate::FormatPreference;
    use async_trait::async_trait;
    use axum::{body::Bytes, http::{HeaderMap, StatusCode}};
    use std::time::Duration;
    use url::Url;

    struct BrokenCache;

    #[async_trait]
    impl EdgeCache for BrokenCache {
        async fn lookup(&self, _key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn store(&self, _key: CacheKey, _response: CachedResponse) -> Result<(), CacheError> {
            Err(CacheError::Rejected("read only".into()))
        }
    }

    fn key() -> CacheKey {
        let url = Url::parse("http://img.test/?url=%2Fa.png&w=10").unwrap();
        CacheKey::build(&url, FormatPreference::AcceptsWebp(true))
    }

    fn response() -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_detached_store_lands() {
        let memory = MemoryCache::default();
        let gateway = CacheGateway::new(Arc::new(memory.clone()), true);

        assert!(gateway.lookup(&key()).await.is_none());
        gateway.store_detached(key(), response());

        for _ in 0..50 {
            if !memory.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gateway.lookup(&key()).await, Some(response()));
    }

    #[tokio::test]
    async fn test_backend_errors_are_swallowed() {
        let gateway = CacheGateway::new(Arc::new(BrokenCache), true);
        assert!(gateway.lookup(&key()).await.is_none());
        gateway.store_detached(key(), response());
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn test_disabled_never_touches_backend() {
        let memory = MemoryCache::default();
        let gateway = CacheGateway::new(Arc::new(memory.clone()), false);
        gateway.store_detached(key(), response());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(memory.is_empty());
        assert!(gateway.lookup(&key()).await.is_none());
    }
}
