//! Functional core for the books service.
//!
//! Pure domain types, validation, traits and wire formats. Everything that
//! performs I/O lives in the `books` binary crate and implements the traits
//! declared here.

pub mod book;
pub mod cache;
pub mod idempotency;
pub mod queue;
pub mod storage;
