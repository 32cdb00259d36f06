use serde::{Deserialize, Serialize};

/// What the ledger holds for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "response", rename_all = "lowercase")]
pub enum IdempotencyRecord<T> {
    /// The key is reserved by a request that has not finished.
    Pending,
    /// The request finished with this response.
    Completed(T),
}
