//! Cache backend implementations.
//!
//! Concrete implementations of `books_core::cache::Cache`. The in-memory
//! cache is always compiled; the `redis` feature adds the Redis backend and
//! makes it the one wired into the application state.

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::{ExpiringStore, MemoryCache};

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
