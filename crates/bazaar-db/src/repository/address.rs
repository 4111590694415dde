//! # Address Repository
//!
//! Database operations for the shipping address book.
//!
//! Orders reference address rows directly; the schema has no cascade on
//! that foreign key, so deleting an address an order references fails
//! with a `ForeignKeyViolation`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{CoreError, ShippingAddress};

/// Fields required to add a shipping address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Repository for shipping address operations.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// Inserts a new shipping address.
    pub async fn create(&self, new_address: NewAddress) -> DbResult<ShippingAddress> {
        debug!(user_id = new_address.user_id, "Creating shipping address");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO shipping_addresses (user_id, street, city, state, postal_code, country, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new_address.user_id)
        .bind(&new_address.street)
        .bind(&new_address.city)
        .bind(&new_address.state)
        .bind(&new_address.postal_code)
        .bind(&new_address.country)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(ShippingAddress {
            id: result.last_insert_rowid(),
            user_id: new_address.user_id,
            street: new_address.street,
            city: new_address.city,
            state: new_address.state,
            postal_code: new_address.postal_code,
            country: new_address.country,
            created_at: now,
        })
    }

    /// Gets an address by id, scoped to its owner.
    ///
    /// A foreign address is reported as NotFound so ids don't leak.
    pub async fn get_owned(&self, user_id: i64, address_id: i64) -> DbResult<ShippingAddress> {
        let address = sqlx::query_as::<_, ShippingAddress>(
            r#"
            SELECT id, user_id, street, city, state, postal_code, country, created_at
            FROM shipping_addresses
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        address.ok_or_else(|| DbError::Domain(CoreError::not_found("Address", address_id)))
    }

    /// Lists a user's addresses, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<ShippingAddress>> {
        let addresses = sqlx::query_as::<_, ShippingAddress>(
            r#"
            SELECT id, user_id, street, city, state, postal_code, country, created_at
            FROM shipping_addresses
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }

    /// Rewrites an address owned by the user.
    ///
    /// Orders reference addresses by id, so an edit is visible through
    /// past orders too; buyers wanting a fresh destination add a new
    /// entry instead.
    pub async fn update(
        &self,
        user_id: i64,
        address_id: i64,
        fields: NewAddress,
    ) -> DbResult<ShippingAddress> {
        let current = self.get_owned(user_id, address_id).await?;

        sqlx::query(
            r#"
            UPDATE shipping_addresses
            SET street = ?2, city = ?3, state = ?4, postal_code = ?5, country = ?6
            WHERE id = ?1
            "#,
        )
        .bind(address_id)
        .bind(&fields.street)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .execute(&self.pool)
        .await?;

        Ok(ShippingAddress {
            street: fields.street,
            city: fields.city,
            state: fields.state,
            postal_code: fields.postal_code,
            country: fields.country,
            ..current
        })
    }

    /// Deletes an address owned by the user.
    ///
    /// ## Errors
    /// * `CoreError::NotFound` - address missing or owned by someone else
    /// * `DbError::ForeignKeyViolation` - an order still references it
    pub async fn delete(&self, user_id: i64, address_id: i64) -> DbResult<()> {
        // Ownership check first so a foreign id never reaches the DELETE.
        self.get_owned(user_id, address_id).await?;

        debug!(user_id, address_id, "Deleting shipping address");

        sqlx::query("DELETE FROM shipping_addresses WHERE id = ?1")
            .bind(address_id)
            .execute(&self.pool)
            .await?;

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
    use crate::repository::user::NewUser;
    use bazaar_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_customer(db: &Database, email: &str, phone: &str) -> i64 {
        db.users()
            .create(NewUser {
                user_name: "Test".to_string(),
                email: email.to_string(),
                phone_number: phone.to_string(),
                password_hash: "hash".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap()
            .id
    }

    fn new_address(user_id: i64) -> NewAddress {
        NewAddress {
            user_id,
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
            country: "US".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let db = test_db().await;
        let user = seed_customer(&db, "a@example.com", "0000000001").await;

        let address = db.addresses().create(new_address(user)).await.unwrap();
        assert!(address.id > 0);

        let listed = db.addresses().list_for_user(user).await.unwrap();
        assert_eq!(listed.len(), 1);

        db.addresses().delete(user, address.id).await.unwrap();
        assert!(db.addresses().list_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rewrites_fields() {
        let db = test_db().await;
        let user = seed_customer(&db, "a@example.com", "0000000001").await;

        let address = db.addresses().create(new_address(user)).await.unwrap();

        let mut fields = new_address(user);
        fields.street = "9 Elm Ave".to_string();
        fields.city = "Shelbyville".to_string();
        let updated = db
            .addresses()
            .update(user, address.id, fields)
            .await
            .unwrap();

        assert_eq!(updated.id, address.id);
        assert_eq!(updated.street, "9 Elm Ave");
        assert_eq!(updated.city, "Shelbyville");

        let listed = db.addresses().list_for_user(user).await.unwrap();
        assert_eq!(listed[0].street, "9 Elm Ave");
    }

    #[tokio::test]
    async fn test_foreign_address_is_not_found() {
        let db = test_db().await;
        let owner = seed_customer(&db, "a@example.com", "0000000001").await;
        let other = seed_customer(&db, "b@example.com", "0000000002").await;

        let address = db.addresses().create(new_address(owner)).await.unwrap();

        let err = db.addresses().get_owned(other, address.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));

        let err = db.addresses().delete(other, address.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));

        // Owner can still see it
        assert!(db.addresses().get_owned(owner, address.id).await.is_ok());
    }
}
