//! JWT authentication module.
//!
//! Handles token generation and validation, plus the `AuthUser` extractor
//! that route handlers use to identify the caller.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <token>
//!        │
//!        ▼
//! extract_bearer_token ──► JwtManager::validate_token ──► Claims { sub }
//!        │                                                     │
//!        ▼                                                     ▼
//!   401 if missing/invalid                    load user row (must be active)
//!                                                              │
//!                                                              ▼
//!                                                   AuthUser { id, role, .. }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use bazaar_core::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, stringified)
    pub sub: String,

    /// Role at token issue time (informational; the extractor re-reads
    /// the user row, so a role change invalidates stale tokens' powers)
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    token_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, token_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            token_lifetime_secs,
        }
    }

    /// Generate an access token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

// =============================================================================
// AuthUser Extractor
// =============================================================================

/// The authenticated caller, resolved from the bearer token.
///
/// Adding `user: AuthUser` to a handler's arguments makes the route
/// require authentication; the extractor rejects with 401 before the
/// handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub user: User,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;

        let claims = state.jwt.validate_token(token)?;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| ApiError::unauthorized("Malformed token subject"))?;

        // Re-read the user: deactivated accounts lose access even while
        // their token is unexpired.
        let user = state
            .db
            .users()
            .get_by_id(user_id)
            .await
            .map_err(ApiError::from)?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::unauthorized("Account is unknown or deactivated"))?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
            user,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(id: i64, role: Role) -> User {
        User {
            id,
            user_name: "Test".to_string(),
            email: "test@example.com".to_string(),
            phone_number: "0123456789".to_string(),
            password_hash: "hash".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.generate_token(&test_user(42, Role::Seller)).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Seller);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);

        let token = signer.generate_token(&test_user(1, Role::Customer)).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        assert!(manager.validate_token("not.a.token").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token(""), None);
    }
}
