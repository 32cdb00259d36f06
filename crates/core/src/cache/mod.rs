mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{book_key, books_all_key, idempotency_key};
pub use serialization::{from_cache_bytes, to_cache_bytes};
pub use traits::Cache;
