use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// Key-value cache with optional TTL.
///
/// Values are opaque bytes; see [`super::to_cache_bytes`] for the encoding
/// used by callers.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Sets a value only if the key is absent (or expired).
    ///
    /// Returns true when this call stored the value. The check and the write
    /// happen atomically.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>)
        -> Result<bool>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;
}
