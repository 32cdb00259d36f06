//! In-memory TTL store without eviction.
//!
//! Entries leave only when they expire or are deleted, however many there
//! are. This is the store for records that must survive until their TTL,
//! such as idempotency records; the bounded `MemoryCache` is for disposable
//! read-through entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use books_core::cache::{Cache, Result};

use super::cache::CacheEntry;

/// Writes between sweeps of expired entries.
const SWEEP_EVERY: usize = 256;

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    writes: usize,
}

impl Entries {
    fn insert(&mut self, key: &str, value: &[u8], ttl: Option<Duration>) {
        self.writes += 1;
        if self.writes % SWEEP_EVERY == 0 {
            self.map.retain(|_, entry| !entry.is_expired());
        }
        self.map
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
    }
}

/// Thread-safe map of expiring entries.
#[derive(Debug, Clone, Default)]
pub struct ExpiringStore {
    entries: Arc<Mutex<Entries>>,
}

impl ExpiringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }
}

#[async_trait]
impl Cache for ExpiringStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;

        match entries.map.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.map.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.entries.lock().await.insert(key, value, ttl);
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let mut entries = self.entries.lock().await;

        if entries.map.get(key).is_some_and(|entry| !entry.is_expired()) {
            return Ok(false);
        }

        entries.insert(key, value, ttl);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.map.remove(key);
        Ok(())
    }
}
