//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError`.

use books_core::storage::RepositoryError;

/// Maps a rusqlite error to a RepositoryError.
///
/// # Error Mapping
///
/// - `SQLITE_CONSTRAINT_PRIMARYKEY` / `UNIQUE` → `Conflict`
/// - `SQLITE_CONSTRAINT_NOTNULL` → `Rejected`
/// - Open failures, busy or locked database → `Unavailable`
/// - `QueryReturnedNoRows` → `NotFound`
/// - Column type mismatches → `Corrupt`
/// - All other errors → `Failed`
///
/// `Conflict` and `NotFound` need the book id; without one they fall back to
/// `Failed`.
fn map_rusqlite_error(err: &rusqlite::Error, id: Option<i64>) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            id.map(RepositoryError::Conflict)
                .unwrap_or_else(|| RepositoryError::Failed(err.to_string()))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL =>
        {
            RepositoryError::Rejected(format!("missing column: {err}"))
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            RepositoryError::Unavailable(err.to_string())
        }

        rusqlite::Error::QueryReturnedNoRows => id
            .map(RepositoryError::NotFound)
            .unwrap_or_else(|| RepositoryError::Failed(err.to_string())),

        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::Corrupt(err.to_string())
        }

        _ => RepositoryError::Failed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// `id` names the book involved; `None` for table-wide statements.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error, id: Option<i64>) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(rusqlite_err, id),
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            RepositoryError::Unavailable("connection closed unexpectedly".to_string())
        }
        _ => RepositoryError::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn failure(code: rusqlite::ErrorCode, extended_code: i32) -> tokio_rusqlite::Error {
        let sqlite_err = ffi::Error {
            code,
            extended_code,
        };
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, None))
    }

    #[test]
    fn test_primary_key_maps_to_conflict() {
        let err = failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        );

        assert_eq!(
            map_tokio_rusqlite_error(err, Some(4)),
            RepositoryError::Conflict(4)
        );
    }

    #[test]
    fn test_not_null_maps_to_rejected() {
        let err = failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_NOTNULL,
        );

        let result = map_tokio_rusqlite_error(err, Some(4));

        assert!(matches!(result, RepositoryError::Rejected(_)));
    }

    #[test]
    fn test_busy_database_is_unavailable() {
        let err = failure(rusqlite::ErrorCode::DatabaseBusy, ffi::SQLITE_BUSY);

        let result = map_tokio_rusqlite_error(err, None);

        assert!(matches!(result, RepositoryError::Unavailable(_)));
    }

    #[test]
    fn test_no_rows_maps_to_not_found_with_id() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows);

        assert_eq!(
            map_tokio_rusqlite_error(err, Some(12)),
            RepositoryError::NotFound(12)
        );
    }

    #[test]
    fn test_no_rows_without_id_is_a_failure() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows);

        let result = map_tokio_rusqlite_error(err, None);

        assert!(matches!(result, RepositoryError::Failed(_)));
    }

    #[test]
    fn test_wrong_column_type_is_corrupt() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::InvalidColumnType(
            0,
            "id".to_string(),
            rusqlite::types::Type::Text,
        ));

        let result = map_tokio_rusqlite_error(err, Some(1));

        assert!(matches!(result, RepositoryError::Corrupt(_)));
    }

    #[test]
    fn test_connection_closed_is_unavailable() {
        let result = map_tokio_rusqlite_error(tokio_rusqlite::Error::ConnectionClosed, None);

        assert!(matches!(result, RepositoryError::Unavailable(_)));
    }

    #[test]
    fn test_other_error_maps_to_failed() {
        let err = tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("test error")));

        let result = map_tokio_rusqlite_error(err, None);

        assert!(matches!(result, RepositoryError::Failed(_)));
    }
}
