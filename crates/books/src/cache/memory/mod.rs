//! In-memory cache backend implementation.
//!
//! `MemoryCache` is a bounded LRU for read-through entries. `ExpiringStore`
//! never evicts and holds records that must live out their TTL.

mod cache;
mod expiring;

pub use cache::MemoryCache;
pub use expiring::ExpiringStore;
