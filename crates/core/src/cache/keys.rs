/// Returns the cache key for the aggregate book list.
pub fn books_all_key() -> &'static str {
    "books_all"
}

/// Returns the cache key for a single book.
pub fn book_key(id: i64) -> String {
    format!("book_{}", id)
}

/// Returns the cache key under which an idempotency record is stored.
///
/// The client-supplied key is opaque; it is namespaced so it can never
/// collide with book keys.
pub fn idempotency_key(key: &str) -> String {
    format!("idempotency_{}", key)
}
