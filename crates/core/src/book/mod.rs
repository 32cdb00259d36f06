mod error;
mod operations;
mod requests;
mod types;

pub use error::BookError;
pub use operations::{check_id_matches, error_messages, validate_book};
pub use requests::{BookInput, UpdateBook};
pub use types::Book;
