/// Request header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// How long a stored result stays replayable.
pub const DEFAULT_IDEMPOTENCY_TTL_SECONDS: u64 = 24 * 60 * 60;

/// How long a pending reservation holds a key. Longer than the request
/// timeout, so a live request keeps its key until it finishes.
pub const DEFAULT_PENDING_TTL_SECONDS: u64 = 15;

/// Longest key accepted; longer keys are treated as absent.
pub const MAX_KEY_LENGTH: usize = 255;

/// Trims a raw header value. Returns `None` for blank or oversized keys, in
/// which case the request runs without idempotency.
pub fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return None;
    }
    Some(key.to_string())
}
