/*!
 * # Authentication Module
 *
 * Bearer-token authentication for the Millwork API. Token issuance lives in an
 * external identity service; this module only validates the JWTs it produces
 * and exposes the caller's identity to handlers through the
 * [`AuthenticatedUser`] extractor.
 */

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ErrorResponse;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // Subject (user ID)
    pub name: Option<String>, // User's display name
    pub email: Option<String>,
    pub jti: String, // JWT ID (unique identifier for this token)
    pub iat: i64,    // Issued at time
    pub exp: i64,    // Expiration time
    pub nbf: i64,    // Not valid before time
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub token_id: String,
}

/// Alias used throughout handlers
pub type AuthenticatedUser = AuthUser;

impl AuthUser {
    /// Name stamped on records such as `ordered_by`, falling back to the user id
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.user_id.clone())
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Authentication service unavailable")]
    ServiceUnavailable,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) | Self::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::TokenCreation(_) | Self::ServiceUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        let body = ErrorResponse {
            status: false,
            message,
            data: None,
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            token_expiration,
        }
    }

    pub fn from_app_config(cfg: &crate::config::AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
        }
    }
}

/// Validates bearer tokens minted by the external identity service
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Validate a JWT and extract the caller's identity
    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        let claims = token_data.claims;
        debug!(user_id = %claims.sub, token_id = %claims.jti, "Validated bearer token");

        Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            token_id: claims.jti,
        })
    }

    /// Mint a token with this service's secret.
    ///
    /// Issuance is owned by the external identity service; this exists for
    /// integration tests and operational tooling that need a valid token
    /// without standing that service up.
    pub fn issue_token(
        &self,
        user_id: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or(AuthError::ServiceUnavailable)?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        auth_service.validate_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "test_secret_that_is_long_enough_for_hs256_use".into(),
            "millwork-api".into(),
            "millwork-auth".into(),
            Duration::from_secs(3600),
        ))
    }

    #[test]
    fn issued_token_round_trips() {
        let service = test_service();
        let token = service
            .issue_token("user-1", Some("Alex"), Some("alex@example.com"))
            .unwrap();
        let user = service.validate_token(&token).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.name.as_deref(), Some("Alex"));
        assert_eq!(user.display_name(), "Alex");
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = test_service();
        assert!(matches!(
            service.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_with_wrong_audience_is_rejected() {
        let issuer = AuthService::new(AuthConfig::new(
            "test_secret_that_is_long_enough_for_hs256_use".into(),
            "some-other-api".into(),
            "millwork-auth".into(),
            Duration::from_secs(3600),
        ));
        let token = issuer.issue_token("user-1", None, None).unwrap();
        assert!(test_service().validate_token(&token).is_err());
    }

    #[test]
    fn display_name_falls_back_to_user_id() {
        let user = AuthUser {
            user_id: "user-9".into(),
            name: None,
            email: None,
            token_id: "jti".into(),
        };
        assert_eq!(user.display_name(), "user-9");
    }
}
