use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use books_auth::CurrentUser;
use books_core::book::{Book, BookInput, UpdateBook};
use books_core::idempotency::{normalize_key, IDEMPOTENCY_KEY_HEADER};

use crate::{handlers::AppError, service::WriteMode, state::AppState};

/// Set on a response that was replayed from the idempotency ledger.
pub const IDEMPOTENT_REPLAYED_HEADER: HeaderName = HeaderName::from_static("idempotent-replayed");

/// List all books (GET /books).
pub async fn list_books(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.service.list().await?))
}

/// Get a single book by ID (GET /books/{id}).
pub async fn get_book(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.service.get(id).await?))
}

/// Create a book (POST /books).
///
/// Answers 201 when the book is persisted, or 202 when it was staged for the
/// ingestion pipeline. With an `Idempotency-Key` header, a repeated request
/// gets the original book back instead of creating another one; a blank or
/// oversized key is ignored.
pub async fn create_book(
    user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<BookInput>,
) -> Result<Response, AppError> {
    let status = match state.service.write_mode() {
        WriteMode::Sync => StatusCode::CREATED,
        WriteMode::Async => StatusCode::ACCEPTED,
    };

    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(normalize_key);

    let Some(key) = key else {
        let book = state.service.create(input).await?;
        tracing::info!(book_id = book.id, user = %user.username(), "Created book");
        return Ok(created_response(status, book, false));
    };

    let outcome = state.service.create_idempotent(&key, input).await?;
    if !outcome.replayed {
        tracing::info!(
            book_id = outcome.book.id,
            user = %user.username(),
            idempotency_key = %key,
            "Created book"
        );
    }

    Ok(created_response(status, outcome.book, outcome.replayed))
}

fn created_response(status: StatusCode, book: Book, replayed: bool) -> Response {
    let location = HeaderValue::try_from(format!("/books/{}", book.id));
    let mut response = (status, Json(book)).into_response();

    if let Ok(location) = location {
        response.headers_mut().insert(header::LOCATION, location);
    }
    if replayed {
        response
            .headers_mut()
            .insert(IDEMPOTENT_REPLAYED_HEADER, HeaderValue::from_static("true"));
    }

    response
}

/// Replace a book (PUT /books/{id}).
pub async fn update_book(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateBook>,
) -> Result<StatusCode, AppError> {
    state.service.update(id, update).await?;

    tracing::info!(book_id = id, "Updated book");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book (DELETE /books/{id}).
pub async fn delete_book(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.service.delete(id).await? {
        return Ok(StatusCode::NOT_FOUND);
    }

    tracing::info!(book_id = id, "Deleted book");
    Ok(StatusCode::NO_CONTENT)
}
