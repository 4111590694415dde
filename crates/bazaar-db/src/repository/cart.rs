//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Cart Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • One cart per user, created lazily on the first add.                  │
//! │  • One line per (cart, product): re-adding merges quantities.           │
//! │  • Every mutation re-checks stock against the MERGED quantity; a        │
//! │    failed merge leaves the existing line untouched.                     │
//! │  • The cart total is an ESTIMATE over base prices. Discounts are        │
//! │    applied only by the order workflow, which snapshots them.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::{validation, Cart, CartLine, CoreError, Money};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Gets the user's cart, creating an empty one if none exists.
    pub async fn get_or_create(&self, user_id: i64) -> DbResult<Cart> {
        if let Some(cart) =
            sqlx::query_as::<_, Cart>("SELECT id, user_id FROM carts WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
        {
            return Ok(cart);
        }

        debug!(user_id, "Creating cart");

        let result = sqlx::query("INSERT INTO carts (user_id) VALUES (?1)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(Cart {
            id: result.last_insert_rowid(),
            user_id,
        })
    }

    /// Lists the lines of the user's cart.
    pub async fn get_lines(&self, user_id: i64) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT cl.id, cl.cart_id, cl.product_id, cl.quantity
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            WHERE c.user_id = ?1
            ORDER BY cl.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Adds a product to the user's cart, merging with an existing line.
    ///
    /// ## Merge Semantics
    /// ```text
    /// Cart already has 2 × product 7 (stock: 4)
    ///      │
    ///      ▼
    /// add_line(product 7, qty 3)
    ///      │
    ///      ├── merged = 2 + 3 = 5 > stock 4
    ///      │        → Err(OutOfStock), line STAYS at quantity 2
    ///      │
    ///      └── merged = 2 + 2 = 4 ≤ stock 4
    ///               → line updated to quantity 4
    /// ```
    ///
    /// ## Errors
    /// * `CoreError::Validation` - quantity out of range
    /// * `CoreError::NotFound` - product missing or inactive
    /// * `CoreError::OutOfStock` - merged quantity exceeds stock
    pub async fn add_line(&self, user_id: i64, product_id: i64, quantity: i64) -> DbResult<CartLine> {
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        // Only active products are addable.
        let product: Option<(i64,)> =
            sqlx::query_as("SELECT stock FROM products WHERE id = ?1 AND is_active = 1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((stock,)) = product else {
            return Err(CoreError::not_found("Product", product_id).into());
        };

        let cart = self.get_or_create(user_id).await?;

        let existing = sqlx::query_as::<_, CartLine>(
            "SELECT id, cart_id, product_id, quantity FROM cart_lines WHERE cart_id = ?1 AND product_id = ?2",
        )
        .bind(cart.id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        let merged = existing.as_ref().map_or(0, |l| l.quantity) + quantity;

        validation::validate_quantity(merged).map_err(CoreError::from)?;

        if merged > stock {
            // Existing line is left unchanged on failure.
            return Err(CoreError::OutOfStock {
                product_id,
                available: stock,
                requested: merged,
            }
            .into());
        }

        if existing.is_none() {
            let line_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE cart_id = ?1")
                    .bind(cart.id)
                    .fetch_one(&self.pool)
                    .await?;
            validation::validate_cart_size(line_count as usize).map_err(CoreError::from)?;
        }

        debug!(user_id, product_id, merged, "Upserting cart line");

        match existing {
            Some(line) => {
                sqlx::query("UPDATE cart_lines SET quantity = ?2 WHERE id = ?1")
                    .bind(line.id)
                    .bind(merged)
                    .execute(&self.pool)
                    .await?;
                Ok(CartLine {
                    quantity: merged,
                    ..line
                })
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO cart_lines (cart_id, product_id, quantity) VALUES (?1, ?2, ?3)",
                )
                .bind(cart.id)
                .bind(product_id)
                .bind(quantity)
                .execute(&self.pool)
                .await?;
                Ok(CartLine {
                    id: result.last_insert_rowid(),
                    cart_id: cart.id,
                    product_id,
                    quantity,
                })
            }
        }
    }

    /// Sets a cart line to an absolute quantity.
    ///
    /// The line must belong to the user's cart; a foreign line is reported
    /// as NotFound rather than Forbidden so ids don't leak.
    pub async fn update_line(&self, user_id: i64, line_id: i64, quantity: i64) -> DbResult<CartLine> {
        validation::validate_quantity(quantity).map_err(CoreError::from)?;

        let line = self.owned_line(user_id, line_id).await?;

        let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(line.product_id)
            .fetch_one(&self.pool)
            .await?;

        if quantity > stock {
            return Err(CoreError::OutOfStock {
                product_id: line.product_id,
                available: stock,
                requested: quantity,
            }
            .into());
        }

        sqlx::query("UPDATE cart_lines SET quantity = ?2 WHERE id = ?1")
            .bind(line_id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        Ok(CartLine { quantity, ..line })
    }

    /// Removes a line from the user's cart.
    pub async fn remove_line(&self, user_id: i64, line_id: i64) -> DbResult<()> {
        let line = self.owned_line(user_id, line_id).await?;

        sqlx::query("DELETE FROM cart_lines WHERE id = ?1")
            .bind(line.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Removes every line from the user's cart.
    pub async fn clear(&self, user_id: i64) -> DbResult<()> {
        debug!(user_id, "Clearing cart");

        sqlx::query(
            "DELETE FROM cart_lines WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Computes the cart total over BASE prices.
    ///
    /// This is a pre-checkout estimate: discounts are deliberately not
    /// applied here. The order workflow computes and freezes effective
    /// prices at checkout.
    pub async fn total(&self, user_id: i64) -> DbResult<Money> {
        let total_cents: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(p.price_cents * cl.quantity)
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            JOIN products p ON p.id = cl.product_id
            WHERE c.user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total_cents.unwrap_or(0)))
    }

    /// Fetches a cart line, verifying it belongs to the user's cart.
    async fn owned_line(&self, user_id: i64, line_id: i64) -> DbResult<CartLine> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT cl.id, cl.cart_id, cl.product_id, cl.quantity
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            WHERE cl.id = ?1 AND c.user_id = ?2
            "#,
        )
        .bind(line_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        line.ok_or_else(|| DbError::Domain(CoreError::not_found("Cart line", line_id)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use crate::repository::user::NewUser;
    use bazaar_core::Role;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, email: &str, phone: &str, role: Role) -> i64 {
        db.users()
            .create(NewUser {
                user_name: "Test".to_string(),
                email: email.to_string(),
                phone_number: phone.to_string(),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_product(db: &Database, owner_id: i64, price_cents: i64, stock: i64) -> i64 {
        db.products()
            .insert(NewProduct {
                name: "Widget".to_string(),
                description: None,
                price_cents,
                discount_bps: None,
                sale_starts_at: None,
                sale_ends_at: None,
                stock,
                category: "gadgets".to_string(),
                brand: "Acme".to_string(),
                image_url: None,
                owner_id,
            })
            .await
            .unwrap()
            .id
    }

    async fn setup() -> (Database, i64, i64, i64) {
        let db = test_db().await;
        let seller = seed_user(&db, "seller@example.com", "0000000001", Role::Seller).await;
        let customer = seed_user(&db, "buyer@example.com", "0000000002", Role::Customer).await;
        let product = seed_product(&db, seller, 1000, 5).await;
        (db, seller, customer, product)
    }

    #[tokio::test]
    async fn test_add_line_creates_cart_lazily() {
        let (db, _, customer, product) = setup().await;

        let line = db.carts().add_line(customer, product, 2).await.unwrap();
        assert_eq!(line.quantity, 2);

        let lines = db.carts().get_lines(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_add_same_product_merges_quantities() {
        let (db, _, customer, product) = setup().await;

        db.carts().add_line(customer, product, 2).await.unwrap();
        let line = db.carts().add_line(customer, product, 3).await.unwrap();

        assert_eq!(line.quantity, 5);
        let lines = db.carts().get_lines(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_merge_exceeding_stock_leaves_line_unchanged() {
        let (db, _, customer, product) = setup().await;

        db.carts().add_line(customer, product, 3).await.unwrap();

        // 3 + 3 = 6 > stock 5
        let err = db.carts().add_line(customer, product, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OutOfStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        let lines = db.carts().get_lines(customer).await.unwrap();
        assert_eq!(lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_inactive_product_is_not_found() {
        let (db, _, customer, product) = setup().await;

        db.products().soft_delete(product).await.unwrap();

        let err = db.carts().add_line(customer, product, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected() {
        let (db, _, customer, product) = setup().await;

        let err = db.carts().add_line(customer, product, 0).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db.carts().add_line(customer, product, -2).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_line_absolute_quantity() {
        let (db, _, customer, product) = setup().await;

        let line = db.carts().add_line(customer, product, 2).await.unwrap();
        let updated = db.carts().update_line(customer, line.id, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);

        // Above stock fails, line untouched
        let err = db
            .carts()
            .update_line(customer, line.id, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OutOfStock { .. })));
        let lines = db.carts().get_lines(customer).await.unwrap();
        assert_eq!(lines[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_foreign_line_is_not_found() {
        let (db, _, customer, product) = setup().await;
        let other =
            seed_user(&db, "other@example.com", "0000000003", Role::Customer).await;

        let line = db.carts().add_line(customer, product, 2).await.unwrap();

        let err = db.carts().update_line(other, line.id, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));

        let err = db.carts().remove_line(other, line.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (db, seller, customer, product) = setup().await;
        let second = seed_product(&db, seller, 500, 10).await;

        let line = db.carts().add_line(customer, product, 1).await.unwrap();
        db.carts().add_line(customer, second, 2).await.unwrap();

        db.carts().remove_line(customer, line.id).await.unwrap();
        assert_eq!(db.carts().get_lines(customer).await.unwrap().len(), 1);

        db.carts().clear(customer).await.unwrap();
        assert!(db.carts().get_lines(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_uses_base_price_not_discount() {
        let (db, seller, customer, _) = setup().await;

        // $10.00 with a 20% discount active
        let discounted = db
            .products()
            .insert(NewProduct {
                name: "Deal".to_string(),
                description: None,
                price_cents: 1000,
                discount_bps: Some(2000),
                sale_starts_at: None,
                sale_ends_at: None,
                stock: 10,
                category: "gadgets".to_string(),
                brand: "Acme".to_string(),
                image_url: None,
                owner_id: seller,
            })
            .await
            .unwrap()
            .id;

        db.carts().add_line(customer, discounted, 3).await.unwrap();

        // Estimate uses the base price: 3 × $10.00, not 3 × $8.00
        let total = db.carts().total(customer).await.unwrap();
        assert_eq!(total.cents(), 3000);
    }

    #[tokio::test]
    async fn test_empty_cart_total_is_zero() {
        let (db, _, customer, _) = setup().await;
        let total = db.carts().total(customer).await.unwrap();
        assert!(total.is_zero());
    }
}
