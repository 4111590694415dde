//! # Order Repository
//!
//! Database operations for the order workflow.
//!
//! ## Order Creation: Two-Phase Stock Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_from_cart (ONE transaction)                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── Verify shipping address belongs to the buyer                    │
//! │    ├── Load cart lines (empty cart → abort)                            │
//! │    │                                                                    │
//! │    ├── PHASE 1: validate every line                                    │
//! │    │     product exists, active, stock ≥ quantity                      │
//! │    │     compute effective unit price (discount window at `now`)       │
//! │    │     any failure → ROLLBACK, nothing debited                       │
//! │    │                                                                    │
//! │    ├── PHASE 2: debit every line                                       │
//! │    │     UPDATE products SET stock = stock - qty                       │
//! │    │     WHERE id = ? AND stock >= qty   ← guarded decrement           │
//! │    │                                                                    │
//! │    ├── INSERT order header (status: pending, frozen total)             │
//! │    ├── INSERT order lines (frozen unit prices)                         │
//! │    └── DELETE cart lines (cart empties atomically with the order)      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Dropping the transaction on any error rolls everything back:          │
//! │  stock, order rows, and cart are all-or-nothing.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! Allowed only from `pending` or `processing`. Credits every line's
//! quantity back to product stock in the same transaction as the status
//! flip, so a crash can never lose or double the restock.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bazaar_core::pricing::effective_unit_price;
use bazaar_core::{policy, CoreError, Order, OrderLine, OrderStatus, Product};

/// All order columns, in struct field order.
const ORDER_COLUMNS: &str =
    "id, user_id, shipping_address_id, status, total_cents, created_at, updated_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Converts the user's cart into an order.
    ///
    /// See the module docs for the full transaction walkthrough.
    ///
    /// ## Errors
    /// * `CoreError::NotFound` - address missing/foreign, or a cart line's
    ///   product vanished or was deactivated
    /// * `CoreError::EmptyCart` - nothing to order
    /// * `CoreError::OutOfStock` - any line exceeds available stock
    pub async fn create_from_cart(
        &self,
        user_id: i64,
        shipping_address_id: i64,
    ) -> DbResult<(Order, Vec<OrderLine>)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Address must exist and belong to the buyer.
        let address_owned: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM shipping_addresses WHERE id = ?1 AND user_id = ?2",
        )
        .bind(shipping_address_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if address_owned.is_none() {
            return Err(CoreError::not_found("Address", shipping_address_id).into());
        }

        let cart_lines: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT cl.product_id, cl.quantity
            FROM cart_lines cl
            JOIN carts c ON c.id = cl.cart_id
            WHERE c.user_id = ?1
            ORDER BY cl.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if cart_lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        // Phase 1: validate all lines and price them before touching stock.
        let mut priced: Vec<(i64, i64, i64)> = Vec::with_capacity(cart_lines.len());
        let mut total_cents: i64 = 0;

        for (product_id, quantity) in &cart_lines {
            let product = fetch_product(&mut tx, *product_id).await?;

            let Some(product) = product.filter(|p| p.is_active) else {
                return Err(CoreError::not_found("Product", *product_id).into());
            };

            if !product.can_fulfil(*quantity) {
                return Err(CoreError::OutOfStock {
                    product_id: *product_id,
                    available: product.stock,
                    requested: *quantity,
                }
                .into());
            }

            let unit_price = effective_unit_price(&product, now);
            total_cents += unit_price.cents() * quantity;
            priced.push((*product_id, *quantity, unit_price.cents()));
        }

        // Phase 2: debit stock with a guarded decrement per line.
        for (product_id, quantity, _) in &priced {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Stock moved underneath us; report what is left now.
                let available: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                    .bind(product_id)
                    .fetch_one(&mut *tx)
                    .await?;
                return Err(CoreError::OutOfStock {
                    product_id: *product_id,
                    available,
                    requested: *quantity,
                }
                .into());
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO orders (user_id, shipping_address_id, status, total_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(user_id)
        .bind(shipping_address_id)
        .bind(OrderStatus::Pending)
        .bind(total_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        let mut lines = Vec::with_capacity(priced.len());
        for (product_id, quantity, unit_price_cents) in &priced {
            let result = sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price_cents)
            .execute(&mut *tx)
            .await?;

            lines.push(OrderLine {
                id: result.last_insert_rowid(),
                order_id,
                product_id: *product_id,
                quantity: *quantity,
                unit_price_cents: *unit_price_cents,
            });
        }

        // The cart empties atomically with the order appearing.
        sqlx::query(
            "DELETE FROM cart_lines WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id, user_id, total_cents, "Order created");

        Ok((
            Order {
                id: order_id,
                user_id,
                shipping_address_id,
                status: OrderStatus::Pending,
                total_cents,
                created_at: now,
                updated_at: now,
            },
            lines,
        ))
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all lines for an order.
    pub async fn get_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists a customer's own orders, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists orders containing at least one product the seller owns.
    pub async fn list_for_seller(&self, seller_id: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT DISTINCT o.id, o.user_id, o.shipping_address_id, o.status,
                   o.total_cents, o.created_at, o.updated_at
            FROM orders o
            JOIN order_lines ol ON ol.order_id = o.id
            JOIN products p ON p.id = ol.product_id
            WHERE p.owner_id = ?1
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lists every order (admin visibility).
    pub async fn list_all(&self, limit: i64, offset: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            ORDER BY created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Whether an order contains at least one product the seller owns.
    pub async fn is_seller_related(&self, order_id: i64, seller_id: i64) -> DbResult<bool> {
        let related: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM order_lines ol
            JOIN products p ON p.id = ol.product_id
            WHERE ol.order_id = ?1 AND p.owner_id = ?2
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(related.is_some())
    }

    /// Sets an order's status.
    ///
    /// Deliberately permissive: any status may overwrite any other, matching
    /// the fulfilment tools this backs. Cancellation does NOT go through
    /// here because it must restock; use [`cancel`](Self::cancel).
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> DbResult<Order> {
        debug!(order_id, ?status, "Updating order status");

        let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Order", order_id).into());
        }

        let order = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id.to_string()))?;

        Ok(order)
    }

    /// Cancels an order and restocks every line.
    ///
    /// ## Errors
    /// * `CoreError::NotFound` - order does not exist
    /// * `CoreError::NotCancellable` - order already shipped, delivered,
    ///   or cancelled
    pub async fn cancel(&self, order_id: i64) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = order else {
            return Err(CoreError::not_found("Order", order_id).into());
        };

        policy::ensure_cancellable(&order)?;

        // Status guard repeated in SQL: the UPDATE only fires while the
        // order is still in a cancellable state.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotCancellable {
                order_id,
                current: order.status,
            }
            .into());
        }

        // Credit every line's quantity back to stock.
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + (
                SELECT ol.quantity FROM order_lines ol
                WHERE ol.order_id = ?1 AND ol.product_id = products.id
            ),
            updated_at = ?2
            WHERE id IN (SELECT product_id FROM order_lines WHERE order_id = ?1)
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_id, "Order cancelled and restocked");

        Ok(Order {
            status: OrderStatus::Cancelled,
            updated_at: now,
            ..order
        })
    }
}

/// Fetches a product inside the order transaction.
async fn fetch_product(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: i64,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, price_cents, discount_bps,
               sale_starts_at, sale_ends_at, stock, is_active,
               category, brand, image_url, owner_id, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::address::NewAddress;
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

    async fn seed_address(db: &Database, user_id: i64) -> i64 {
        db.addresses()
            .create(NewAddress {
                user_id,
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                postal_code: "62701".to_string(),
                country: "US".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_product(
        db: &Database,
        owner_id: i64,
        price_cents: i64,
        discount_bps: Option<i64>,
        stock: i64,
    ) -> i64 {
        db.products()
            .insert(NewProduct {
                name: "Widget".to_string(),
                description: None,
                price_cents,
                discount_bps,
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

    /// (db, seller_id, customer_id, address_id)
    async fn setup() -> (Database, i64, i64, i64) {
        let db = test_db().await;
        let seller = seed_user(&db, "seller@example.com", "0000000001", Role::Seller).await;
        let customer = seed_user(&db, "buyer@example.com", "0000000002", Role::Customer).await;
        let address = seed_address(&db, customer).await;
        (db, seller, customer, address)
    }

    #[tokio::test]
    async fn test_create_order_snapshots_discounted_price() {
        let (db, seller, customer, address) = setup().await;

        // $100.00 at 20% off, buy 3 → total $240.00
        let product = seed_product(&db, seller, 10000, Some(2000), 10).await;
        db.carts().add_line(customer, product, 3).await.unwrap();

        let (order, lines) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 24000);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price_cents, 8000);
        assert_eq!(lines[0].quantity, 3);

        // Stock debited, cart emptied
        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 7);
        assert!(db.carts().get_lines(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_total_survives_price_change() {
        let (db, seller, customer, address) = setup().await;

        let product = seed_product(&db, seller, 5000, None, 10).await;
        db.carts().add_line(customer, product, 2).await.unwrap();

        let (order, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();
        assert_eq!(order.total_cents, 10000);

        // Seller doubles the price afterwards
        let mut p = db.products().get_by_id(product).await.unwrap().unwrap();
        p.price_cents = 10000;
        db.products().update(&p).await.unwrap();

        let fetched = db.orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(fetched.total_cents, 10000);
        let lines = db.orders().get_lines(order.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 5000);
    }

    #[tokio::test]
    async fn test_create_order_is_all_or_nothing() {
        let (db, seller, customer, address) = setup().await;

        let in_stock = seed_product(&db, seller, 1000, None, 5).await;
        let sold_out = seed_product(&db, seller, 2000, None, 2).await;

        db.carts().add_line(customer, in_stock, 2).await.unwrap();
        db.carts().add_line(customer, sold_out, 2).await.unwrap();

        // Someone else takes the last units before checkout.
        let mut p = db.products().get_by_id(sold_out).await.unwrap().unwrap();
        p.stock = 0;
        db.products().update(&p).await.unwrap();

        let err = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OutOfStock {
                available: 0,
                requested: 2,
                ..
            })
        ));

        // Nothing was debited, the cart is intact, no order exists.
        let p = db.products().get_by_id(in_stock).await.unwrap().unwrap();
        assert_eq!(p.stock, 5);
        assert_eq!(db.carts().get_lines(customer).await.unwrap().len(), 2);
        assert!(db.orders().list_for_user(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let (db, _, customer, address) = setup().await;

        let err = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_foreign_address_rejected() {
        let (db, seller, customer, _) = setup().await;
        let other = seed_user(&db, "other@example.com", "0000000003", Role::Customer).await;
        let foreign_address = seed_address(&db, other).await;

        let product = seed_product(&db, seller, 1000, None, 5).await;
        db.carts().add_line(customer, product, 1).await.unwrap();

        let err = db
            .orders()
            .create_from_cart(customer, foreign_address)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));

        // Stock untouched
        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 5);
    }

    #[tokio::test]
    async fn test_last_unit_goes_to_exactly_one_buyer() {
        let (db, seller, first, address_first) = setup().await;
        let second = seed_user(&db, "second@example.com", "0000000004", Role::Customer).await;
        let address_second = seed_address(&db, second).await;

        let product = seed_product(&db, seller, 1000, None, 1).await;

        db.carts().add_line(first, product, 1).await.unwrap();
        db.carts().add_line(second, product, 1).await.unwrap();

        db.orders()
            .create_from_cart(first, address_first)
            .await
            .unwrap();

        let err = db
            .orders()
            .create_from_cart(second, address_second)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OutOfStock { .. })));

        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 0);
    }

    /// Same race, but with both checkouts actually in flight at once. Uses
    /// a file-backed pool so the two transactions run on separate
    /// connections instead of being serialized by the single in-memory one.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_debit_last_unit_once() {
        let path = std::env::temp_dir().join(format!(
            "bazaar-checkout-race-{}-{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_micros()
        ));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();

        let seller = seed_user(&db, "seller@example.com", "0000000001", Role::Seller).await;
        let first = seed_user(&db, "first@example.com", "0000000002", Role::Customer).await;
        let second = seed_user(&db, "second@example.com", "0000000003", Role::Customer).await;
        let address_first = seed_address(&db, first).await;
        let address_second = seed_address(&db, second).await;

        let product = seed_product(&db, seller, 1000, None, 1).await;
        db.carts().add_line(first, product, 1).await.unwrap();
        db.carts().add_line(second, product, 1).await.unwrap();

        let db_a = db.clone();
        let db_b = db.clone();
        let a =
            tokio::spawn(async move { db_a.orders().create_from_cart(first, address_first).await });
        let b = tokio::spawn(async move {
            db_b.orders().create_from_cart(second, address_second).await
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Exactly one checkout wins, whichever way the writes interleave.
        assert!(a.is_ok() ^ b.is_ok());

        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 0);
        assert_eq!(db.orders().list_all(50, 0).await.unwrap().len(), 1);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test]
    async fn test_cancel_restocks_all_lines() {
        let (db, seller, customer, address) = setup().await;

        let a = seed_product(&db, seller, 1000, None, 5).await;
        let b = seed_product(&db, seller, 2000, None, 3).await;
        db.carts().add_line(customer, a, 2).await.unwrap();
        db.carts().add_line(customer, b, 3).await.unwrap();

        let (order, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();
        assert_eq!(db.products().get_by_id(a).await.unwrap().unwrap().stock, 3);
        assert_eq!(db.products().get_by_id(b).await.unwrap().unwrap().stock, 0);

        let cancelled = db.orders().cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        assert_eq!(db.products().get_by_id(a).await.unwrap().unwrap().stock, 5);
        assert_eq!(db.products().get_by_id(b).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_cancel_guards_status() {
        let (db, seller, customer, address) = setup().await;

        let product = seed_product(&db, seller, 1000, None, 5).await;
        db.carts().add_line(customer, product, 1).await.unwrap();
        let (order, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        db.orders()
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();

        let err = db.orders().cancel(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotCancellable {
                current: OrderStatus::Shipped,
                ..
            })
        ));

        // No restock happened
        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 4);
    }

    #[tokio::test]
    async fn test_cancel_twice_fails() {
        let (db, seller, customer, address) = setup().await;

        let product = seed_product(&db, seller, 1000, None, 5).await;
        db.carts().add_line(customer, product, 2).await.unwrap();
        let (order, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        db.orders().cancel(order.id).await.unwrap();
        let err = db.orders().cancel(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotCancellable { .. })
        ));

        // Restock applied exactly once
        let p = db.products().get_by_id(product).await.unwrap().unwrap();
        assert_eq!(p.stock, 5);
    }

    #[tokio::test]
    async fn test_update_status_is_permissive() {
        let (db, seller, customer, address) = setup().await;

        let product = seed_product(&db, seller, 1000, None, 5).await;
        db.carts().add_line(customer, product, 1).await.unwrap();
        let (order, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        let o = db
            .orders()
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(o.status, OrderStatus::Delivered);

        // Backwards moves are allowed by design
        let o = db
            .orders()
            .update_status(order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(o.status, OrderStatus::Processing);

        let err = db
            .orders()
            .update_status(9999, OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_seller_order_visibility() {
        let (db, seller, customer, address) = setup().await;
        let other_seller =
            seed_user(&db, "other-seller@example.com", "0000000005", Role::Seller).await;

        let mine = seed_product(&db, seller, 1000, None, 5).await;
        let theirs = seed_product(&db, other_seller, 2000, None, 5).await;

        // Order 1 contains only this seller's product
        db.carts().add_line(customer, mine, 1).await.unwrap();
        let (order_mine, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        // Order 2 contains only the other seller's product
        db.carts().add_line(customer, theirs, 1).await.unwrap();
        let (order_theirs, _) = db
            .orders()
            .create_from_cart(customer, address)
            .await
            .unwrap();

        let visible = db.orders().list_for_seller(seller).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, order_mine.id);

        assert!(db
            .orders()
            .is_seller_related(order_mine.id, seller)
            .await
            .unwrap());
        assert!(!db
            .orders()
            .is_seller_related(order_theirs.id, seller)
            .await
            .unwrap());

        // Admin-scope listing sees both
        let all = db.orders().list_all(50, 0).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
