//! Key-value cache abstraction used to memoise provider responses.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Returns the cached value, or `None` if absent or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores a value. `None` for `ttl` keeps it until removed.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);

    async fn remove(&self, key: &K);

    async fn clear(&self);
}
