use std::{env, time::Duration};

use crate::error::AuthError;

const DEFAULT_ISSUER: &str = "MyApi";
const DEFAULT_AUDIENCE: &str = "MyApiClients";
const DEFAULT_TOKEN_EXP_MINUTES: u64 = 60;
const DEFAULT_DEMO_PASSWORD: &str = "123";

/// Token signing and login configuration.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
    /// Password accepted by the demo login for any username.
    pub demo_password: String,
}

impl AuthConfig {
    /// Creates a configuration with the given secret and default claims.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_EXP_MINUTES * 60),
            demo_password: DEFAULT_DEMO_PASSWORD.to_string(),
        }
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `JWT_SECRET`: HMAC signing secret (required)
    /// - `JWT_ISSUER`: `iss` claim (default: `MyApi`)
    /// - `JWT_AUDIENCE`: `aud` claim (default: `MyApiClients`)
    /// - `TOKEN_EXP_MINUTES`: Token lifetime in minutes (default: 60)
    /// - `DEMO_PASSWORD`: Password accepted by `POST /login` (default: `123`)
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when `JWT_SECRET` is missing or empty, or
    /// when `TOKEN_EXP_MINUTES` is not a positive integer.
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Config("JWT_SECRET must be set".to_string()))?;

        let token_exp_minutes = match env::var("TOKEN_EXP_MINUTES") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| {
                    AuthError::Config(format!("TOKEN_EXP_MINUTES is not a positive integer: {raw}"))
                })?,
            Err(_) => DEFAULT_TOKEN_EXP_MINUTES,
        };

        Ok(Self {
            jwt_secret,
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
            audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string()),
            token_ttl: Duration::from_secs(token_exp_minutes * 60),
            demo_password: env::var("DEMO_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_DEMO_PASSWORD.to_string()),
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}
