//! Holds the snapshot a user session is currently looking at.

use crate::core::coin::{CurrencyUnit, Snapshot};
use crate::core::fetch::{FetchError, SnapshotProvider};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Session-scoped view of the market.
///
/// Each refresh replaces the current snapshot wholesale. When refreshes
/// overlap, only the most recently started one may publish its result.
pub struct Session<P: SnapshotProvider> {
    provider: P,
    generation: AtomicU64,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl<P: SnapshotProvider> Session<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            generation: AtomicU64::new(0),
            current: RwLock::new(None),
        }
    }

    /// Fetches a snapshot for `currency` and makes it current.
    ///
    /// Returns `Ok(None)` when a later refresh started while this one was in
    /// flight; the stale result is dropped.
    pub async fn refresh(&self, currency: CurrencyUnit) -> Result<Option<Arc<Snapshot>>, FetchError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.provider.load(currency).await?;

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Discarding superseded {} snapshot", currency);
            return Ok(None);
        }
        *current = Some(Arc::clone(&snapshot));
        Ok(Some(snapshot))
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
