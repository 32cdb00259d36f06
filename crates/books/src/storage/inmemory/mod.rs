//! In-memory storage backends.
//!
//! Data lives in maps behind `Arc<RwLock<_>>` and is lost when the
//! process exits. These are the default backends and the ones the test
//! suite runs against.

mod books;
mod staging;

pub use books::InMemoryBookRepository;
pub use staging::InMemoryStagingRepository;
