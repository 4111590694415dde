//! Account routes: registration, login, profile.
//!
//! Passwords are hashed with Argon2id at registration and verified at
//! login; the hash never appears in any response body.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{validation, Role, User};
use bazaar_db::repository::user::NewUser;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// Public view of a user (no password hash).
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    /// Defaults to `customer`.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Hashes a password with Argon2id and a fresh OS-generated salt.
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?
        .to_string())
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    validation::validate_user_name(&req.user_name).map_err(|e| ApiError::validation(e.to_string()))?;
    validation::validate_email(&req.email).map_err(|e| ApiError::validation(e.to_string()))?;
    validation::validate_phone_number(&req.phone_number)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    if req.password.len() < 8 {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    let password_hash = hash_password(&req.password)?;

    let user = state
        .db
        .users()
        .create(NewUser {
            user_name: req.user_name,
            email: req.email,
            phone_number: req.phone_number,
            password_hash,
            role: req.role.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// `POST /auth/login`
///
/// A single generic message covers unknown email, wrong password, and
/// deactivated accounts, so login responses don't reveal which it was.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .db
        .users()
        .get_by_email(&req.email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::internal(format!("Stored hash is malformed: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let access_token = state.jwt.generate_token(&user)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// `GET /users/me`
pub async fn me(user: AuthUser) -> Json<UserDto> {
    Json(UserDto::from(user.user))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `GET /users` (admin)
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::forbidden("admin access required"));
    }

    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let offset = params.offset.unwrap_or(0).max(0);

    let users = state.db.users().list(limit, offset).await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// `DELETE /users/:id` (admin)
///
/// Deactivates the account. The auth extractor re-reads the user row, so
/// a deactivated account loses access on its next request even with an
/// unexpired token.
pub async fn deactivate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::forbidden("admin access required"));
    }

    state.db.users().deactivate(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies_and_salts() {
        let hash = hash_password("hunter2-hunter2").unwrap();

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2-hunter2", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong-password", &parsed)
            .is_err());

        // Fresh salt every time: same password, different hash
        assert_ne!(hash, hash_password("hunter2-hunter2").unwrap());
    }
}
