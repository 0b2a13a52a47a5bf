//! In-process edge cache with least-recently-used eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use super::{CacheError, CachedResponse, EdgeCache};
use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::pipeline::CacheKey;

/// Bounded in-memory cache.
///
/// Holds at most `max_entries` responses whose bodies total at most
/// `max_bytes`; the least recently used entries go first.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Arc<Mutex<Inner>>,
    max_bytes: u64,
}

struct Inner {
    lru: LruCache<CacheKey, CachedResponse>,
    bytes_in_use: u64,
}

impl MemoryCache {
    /// A cache holding up to `max_entries` responses and `max_bytes` of body.
    /// A zero entry limit is treated as one.
    pub fn new(max_entries: usize, max_bytes: u64) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                lru: LruCache::new(capacity),
                bytes_in_use: 0,
            })),
            max_bytes,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.max_bytes)
    }

    /// Number of cached responses.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Total body bytes currently held.
    pub fn bytes_in_use(&self) -> u64 {
        self.inner.lock().bytes_in_use
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

fn weight(response: &CachedResponse) -> u64 {
    response.body.len() as u64
}

#[async_trait]
impl EdgeCache for MemoryCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.inner.lock().lru.get(key).cloned())
    }

    async fn store(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        let size = weight(&response);
        if size > self.max_bytes {
            return Err(CacheError::Rejected(format!(
                "{} byte body exceeds the {} byte cache budget",
                size, self.max_bytes
            )));
        }

        let (entries, evicted) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let mut evicted = 0usize;

            inner.bytes_in_use = inner.bytes_in_use.saturating_add(size);
            if let Some((pushed_out, removed)) = inner.lru.push(key.clone(), response) {
                inner.bytes_in_use = inner.bytes_in_use.saturating_sub(weight(&removed));
                if pushed_out != key {
                    evicted += 1;
                }
            }
            while inner.bytes_in_use > self.max_bytes {
                match inner.lru.pop_lru() {
                    Some((_, removed)) => {
                        inner.bytes_in_use = inner.bytes_in_use.saturating_sub(weight(&removed));
                        evicted += 1;
                    }
                    None => break,
                }
            }
            (inner.lru.len(), evicted)
        };

        if evicted > 0 {
            tracing::debug!(evicted, "Evicted least recently used cache entries");
            metrics::record_cache_evictions(evicted);
        }
        metrics::record_cache_size(entries);
        Ok(())
    }
}
