//! Redis cache backend implementation.
//!
//! Provides a distributed cache shared by every API instance and consumer.

mod cache;
mod error;

pub use cache::RedisCache;
