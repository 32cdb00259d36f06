//! Bearer token authentication for the books service.
//!
//! This crate provides:
//! - HS256 token issuance and validation
//! - The `POST /login` route
//! - An Axum extractor that rejects requests without a valid token

mod config;
mod error;
mod extractors;
mod handlers;
mod state;
mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractors::CurrentUser;
pub use handlers::{auth_routes, LoginRequest, LoginResponse};
pub use state::AuthState;
pub use token::{issue_token, validate_token, Claims};
