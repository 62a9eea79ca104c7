//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs issued by the identity provider; `sub` is the user
//! id. The first authenticated request for a new `sub` provisions the user
//! row with zeroed streak counters.

use axum::{
    extract::{Request, State},
    http::{Method, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::api::error::ApiError;
use crate::database::UserRepository;
use crate::domain::NewUser;

/// Paths served without a token.
const PUBLIC_PATHS: [&str; 2] = ["/health", "/ready"];

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Display name supplied at signup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// The caller, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Issue a token. Used by tests and local tooling.
pub fn generate_jwt(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
    expiry_secs: i64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(String::from),
        exp: now + expiry_secs,
        iat: now,
        aud: Some("authenticated".to_string()),
        role: Some("authenticated".to_string()),
        user_metadata: None,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a token's signature and expiry, and its audience when one is configured.
pub fn validate_jwt(token: &str, secret: &str, audience: Option<&str>) -> anyhow::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    if token_data.claims.sub.trim().is_empty() {
        anyhow::bail!("token has an empty subject");
    }
    Ok(token_data.claims)
}

/// `Bearer <token>` from the Authorization header.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticate the request and provision the user on first sight.
///
/// Preflight and health requests pass through untouched. Everything else
/// fails closed with [`ApiError::Unauthorized`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if req.method() == Method::OPTIONS || PUBLIC_PATHS.contains(&req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let Some(secret) = state.config.gateway.jwt_secret.as_deref() else {
        tracing::error!("🔒 JWT secret not configured, rejecting request");
        return Err(ApiError::Unauthorized);
    };

    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;
    let claims = validate_jwt(token, secret, state.config.gateway.jwt_audience.as_deref())
        .map_err(|e| {
            tracing::debug!("🔒 Token rejected - error={}", e);
            ApiError::Unauthorized
        })?;

    let new_user = NewUser {
        id: claims.sub.clone(),
        email: claims.email.clone().unwrap_or_default(),
        username: claims.user_metadata.and_then(|m| m.username),
    };
    state.database.ensure_user(&new_user).await?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    #[test]
    fn test_round_trip_claims() {
        let token = generate_jwt("user-1", Some("a@b.c"), SECRET, 3600).unwrap();
        let claims = validate_jwt(&token, SECRET, None).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_jwt("user-1", None, SECRET, 3600).unwrap();
        assert!(validate_jwt(&token, "another-secret-another-secret-123", None).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = generate_jwt("user-1", None, SECRET, -3600).unwrap();
        assert!(validate_jwt(&token, SECRET, None).is_err());
    }

    #[test]
    fn test_audience_checked_only_when_configured() {
        let token = generate_jwt("user-1", None, SECRET, 3600).unwrap();
        assert!(validate_jwt(&token, SECRET, Some("authenticated")).is_ok());
        assert!(validate_jwt(&token, SECRET, Some("service_role")).is_err());
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let token = generate_jwt("  ", None, SECRET, 3600).unwrap();
        assert!(validate_jwt(&token, SECRET, None).is_err());
    }
}
