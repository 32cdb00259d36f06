use super::error::BookError;
use super::requests::BookInput;

/// Validates a book payload before it reaches any store.
///
/// Every violation is reported, not just the first one.
pub fn validate_book(input: &BookInput) -> Result<(), Vec<BookError>> {
    let mut errors = Vec::new();

    if input.title.trim().is_empty() {
        errors.push(BookError::TitleRequired);
    }
    if input.author.trim().is_empty() {
        errors.push(BookError::AuthorRequired);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Ensures the id in the request path matches the id in the body.
pub fn check_id_matches(path: i64, body: i64) -> Result<(), BookError> {
    if path != body {
        return Err(BookError::IdMismatch { path, body });
    }
    Ok(())
}

/// Renders validation errors as the message list returned to clients.
pub fn error_messages(errors: &[BookError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}
