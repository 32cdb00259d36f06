//! JSON encoding of cache values.
//!
//! Values are stored as JSON so they stay readable from `redis-cli`. The
//! target type is always named at the call site; nothing is decoded into an
//! untyped value.

use serde::{de::DeserializeOwned, Serialize};

use super::{CacheError, Result};

/// Serializes a value to JSON bytes for storage in the cache.
pub fn to_cache_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserializes JSON bytes read from the cache into `T`.
pub fn from_cache_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
}
