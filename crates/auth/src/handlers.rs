//! HTTP handlers for auth routes.

use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{error::AuthError, token::issue_token, AuthState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Creates the auth router.
///
/// Routes:
/// - `POST /login` - Exchange demo credentials for a bearer token
pub fn auth_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    AuthState: FromRef<S>,
{
    Router::new().route("/login", post(login))
}

async fn login(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    if request.password != state.config.demo_password {
        tracing::info!(username = %request.username, "Login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    let token = issue_token(&state.config, &request.username, Utc::now())?;
    tracing::info!(username = %request.username, "Issued token");

    Ok(Json(LoginResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate_token, AuthConfig};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> (Router, AuthState) {
        let state = AuthState::new(AuthConfig::new("login-secret"));
        (auth_routes().with_state(state.clone()), state)
    }

    fn login_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_with_demo_password() {
        let (app, state) = app();

        let response = app
            .oneshot(login_request(r#"{"username":"alice","password":"123"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let login: LoginResponse = serde_json::from_slice(&body).unwrap();
        let claims = validate_token(&state.config, &login.token).unwrap();

        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (app, _) = app();

        let response = app
            .oneshot(login_request(r#"{"username":"alice","password":"wrong"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
