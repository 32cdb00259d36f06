use thiserror::Error;

/// Errors produced while validating book payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Author is required")]
    AuthorRequired,
    #[error("Id mismatch")]
    IdMismatch { path: i64, body: i64 },
}
