//! Message queue contract for the asynchronous ingestion path.
//!
//! Delivery is at-least-once: a received message stays hidden for the
//! queue's visibility window and is redelivered unless it is deleted.

mod envelope;
mod error;
mod policy;
mod traits;
mod types;

pub use envelope::{decode_payload, encode_event, BookAction, BookEvent};
pub use error::{QueueError, Result};
pub use policy::{DeliveryPolicy, Disposition, FailureKind, DEFAULT_MAX_RECEIVE_COUNT};
pub use traits::MessageQueue;
pub use types::QueueMessage;
