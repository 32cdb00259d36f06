use thiserror::Error;

/// Failures of the book stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Book not found: {0}")]
    NotFound(i64),
    /// A row with this id already exists.
    #[error("Book {0} already exists")]
    Conflict(i64),
    /// The store could not be reached. Retrying later may succeed.
    #[error("Book store unavailable: {0}")]
    Unavailable(String),
    #[error("Book store operation failed: {0}")]
    Failed(String),
    /// A stored row could not be read back as a book.
    #[error("Corrupt book record: {0}")]
    Corrupt(String),
    /// The store refused the book as given.
    #[error("Book rejected by store: {0}")]
    Rejected(String),
}

impl RepositoryError {
    /// HTTP status for a store failure that reaches a handler.
    ///
    /// ```
    /// use books_core::storage::RepositoryError;
    ///
    /// assert_eq!(RepositoryError::NotFound(1).status_code(), 404);
    /// assert_eq!(RepositoryError::Unavailable("down".into()).status_code(), 503);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Rejected(_) => 400,
            Self::Unavailable(_) => 503,
            Self::Failed(_) | Self::Corrupt(_) => 500,
        }
    }

    /// The book id the failure is about, when there is one.
    pub fn book_id(&self) -> Option<i64> {
        match self {
            Self::NotFound(id) | Self::Conflict(id) => Some(*id),
            _ => None,
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_book() {
        assert_eq!(RepositoryError::NotFound(42).to_string(), "Book not found: 42");
        assert_eq!(RepositoryError::Conflict(7).to_string(), "Book 7 already exists");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RepositoryError::NotFound(1).status_code(), 404);
        assert_eq!(RepositoryError::Conflict(1).status_code(), 409);
        assert_eq!(RepositoryError::Rejected("no id".into()).status_code(), 400);
        assert_eq!(RepositoryError::Unavailable("refused".into()).status_code(), 503);
        assert_eq!(RepositoryError::Failed("syntax".into()).status_code(), 500);
        assert_eq!(RepositoryError::Corrupt("year".into()).status_code(), 500);
    }

    #[test]
    fn test_book_id() {
        assert_eq!(RepositoryError::Conflict(9).book_id(), Some(9));
        assert_eq!(RepositoryError::Failed("x".into()).book_id(), None);
    }
}
