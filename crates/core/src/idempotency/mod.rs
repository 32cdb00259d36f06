//! Idempotency records for client-supplied idempotency keys.
//!
//! A key moves through two states. `Pending` is written atomically when a
//! request reserves the key and expires after a few seconds. `Completed`
//! replaces it once the response is known and lives for the retention
//! window.

mod error;
mod key;
mod ledger;
mod record;

pub use error::{IdempotencyError, Result};
pub use key::{
    normalize_key, DEFAULT_IDEMPOTENCY_TTL_SECONDS, DEFAULT_PENDING_TTL_SECONDS,
    IDEMPOTENCY_KEY_HEADER, MAX_KEY_LENGTH,
};
pub use ledger::{check, lookup, release, save, try_reserve, IdempotencyLedger};
pub use record::IdempotencyRecord;
