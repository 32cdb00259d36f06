use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use books_auth::auth_routes;

use crate::{
    handlers::{
        books::{
            create_book, delete_book, get_book, list_books, update_book,
            IDEMPOTENT_REPLAYED_HEADER,
        },
        health::{health, ping},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for the book endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("idempotency-key"),
        ])
        .expose_headers([header::LOCATION, IDEMPOTENT_REPLAYED_HEADER]);

    let book_routes = Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .layer(cors);

    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .merge(book_routes)
        .merge(auth_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
