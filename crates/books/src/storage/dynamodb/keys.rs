//! DynamoDB key generation functions.
//!
//! Pure functions, no side effects.

pub const BOOK_PREFIX: &str = "BOOK#";

/// Generate primary key for a staged Book.
///
/// Pattern: `BOOK#<id>`
pub fn book_pk(id: i64) -> String {
    format!("{BOOK_PREFIX}{id}")
}

/// Generate sort key for a staged Book.
///
/// Pattern: `BOOK#<id>` (same as PK for single-item access)
pub fn book_sk(id: i64) -> String {
    format!("{BOOK_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_keys() {
        assert_eq!(book_pk(12), "BOOK#12");
        assert_eq!(book_sk(12), "BOOK#12");
    }
}
