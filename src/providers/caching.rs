use crate::core::cache::Cache;
use crate::core::coin::{CurrencyUnit, Snapshot};
use crate::core::fetch::{FetchError, SnapshotProvider};
use crate::store::MemoryCache;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Memoises snapshots per currency unit for a fixed time-to-live.
///
/// Loads are serialised, so concurrent requests for one unit trigger at most
/// one fetch. Failures are never cached.
pub struct CachingSnapshotProvider<T: SnapshotProvider> {
    inner: T,
    cache: Arc<dyn Cache<CurrencyUnit, Arc<Snapshot>>>,
    ttl: Duration,
    fetch_lock: Mutex<()>,
}

impl<T: SnapshotProvider> CachingSnapshotProvider<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self::with_cache(inner, Arc::new(MemoryCache::new()), ttl)
    }

    pub fn with_cache(
        inner: T,
        cache: Arc<dyn Cache<CurrencyUnit, Arc<Snapshot>>>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl,
            fetch_lock: Mutex::new(()),
        }
    }

    /// Drops the cached snapshot for one unit so the next load refetches.
    pub async fn invalidate(&self, currency: CurrencyUnit) {
        debug!("Invalidating cached snapshot for {}", currency);
        self.cache.remove(&currency).await;
    }

    pub async fn clear(&self) {
        self.cache.clear().await;
    }
}

#[async_trait]
impl<T: SnapshotProvider> SnapshotProvider for CachingSnapshotProvider<T> {
    async fn load(&self, currency: CurrencyUnit) -> Result<Arc<Snapshot>, FetchError> {
        let _guard = self.fetch_lock.lock().await;
        if let Some(snapshot) = self.cache.get(&currency).await {
            debug!(
                "Cache hit for {} snapshot fetched at {}",
                currency,
                snapshot.fetched_at()
            );
            return Ok(snapshot);
        }

        debug!("Cache miss for {} snapshot", currency);
        let snapshot = self.inner.load(currency).await?;
        self.cache
            .put(currency, Arc::clone(&snapshot), Some(self.ttl))
            .await;
        Ok(snapshot)
    }
}
