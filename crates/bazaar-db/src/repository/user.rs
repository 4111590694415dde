//! # User Repository
//!
//! Database operations for user accounts.
//!
//! Password hashing happens in the server layer; this repository only
//! stores and returns the finished hash.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{Role, User};

/// Fields required to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - email or phone number already taken
    pub async fn create(&self, new_user: NewUser) -> DbResult<User> {
        debug!(email = %new_user.email, "Creating user");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (user_name, email, phone_number, password_hash, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&new_user.user_name)
        .bind(&new_user.email)
        .bind(&new_user.phone_number)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        Ok(User {
            id,
            user_name: new_user.user_name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: true,
            created_at: now,
        })
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, email, phone_number, password_hash, role, is_active, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email (login lookup).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, email, phone_number, password_hash, role, is_active, created_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists all users (admin only at the policy layer).
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, email, phone_number, password_hash, role, is_active, created_at
            FROM users
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Deactivates a user account (soft delete).
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_user(email: &str, phone: &str, role: Role) -> NewUser {
        NewUser {
            user_name: "Test User".to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            password_hash: "argon2-hash-placeholder".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let db = test_db().await;

        let user = db
            .users()
            .create(new_user("ada@example.com", "0123456789", Role::Customer))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.role, Role::Customer);
        assert!(user.is_active);

        let fetched = db.users().get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "ada@example.com");

        let by_email = db
            .users()
            .get_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;

        db.users()
            .create(new_user("dup@example.com", "0000000001", Role::Customer))
            .await
            .unwrap();

        let err = db
            .users()
            .create(new_user("dup@example.com", "0000000002", Role::Customer))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = test_db().await;

        db.users()
            .create(new_user("a@example.com", "0000000003", Role::Customer))
            .await
            .unwrap();

        let err = db
            .users()
            .create(new_user("b@example.com", "0000000003", Role::Customer))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate() {
        let db = test_db().await;

        let user = db
            .users()
            .create(new_user("gone@example.com", "0000000004", Role::Seller))
            .await
            .unwrap();

        db.users().deactivate(user.id).await.unwrap();

        let fetched = db.users().get_by_id(user.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);

        let err = db.users().deactivate(9999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
