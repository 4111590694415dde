//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Stock Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.stock is never negative.                                      │
//! │                                                                         │
//! │  Mutation paths:                                                        │
//! │  • Owner/admin edits via update()          (absolute value)            │
//! │  • Order creation debit (OrderRepository)  (guarded decrement)         │
//! │  • Order cancellation credit (OrderRepository)                         │
//! │                                                                         │
//! │  A CHECK (stock >= 0) constraint backs the application guard.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bazaar_core::Product;

/// All product columns, in struct field order. Kept in one place so every
/// SELECT decodes into `Product` the same way.
const PRODUCT_COLUMNS: &str = r#"
    id, name, description, price_cents, discount_bps,
    sale_starts_at, sale_ends_at, stock, is_active,
    category, brand, image_url, owner_id, created_at, updated_at
"#;

/// Fields required to list a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub discount_bps: Option<i64>,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub sale_ends_at: Option<DateTime<Utc>>,
    pub stock: i64,
    pub category: String,
    pub brand: String,
    pub image_url: Option<String>,
    pub owner_id: i64,
}

/// Search filters for the catalog. Every field is optional; defaults
/// match everything active.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match against the product name.
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, new_product: NewProduct) -> DbResult<Product> {
        debug!(name = %new_product.name, owner_id = new_product.owner_id, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, description, price_cents, discount_bps,
                sale_starts_at, sale_ends_at, stock, is_active,
                category, brand, image_url, owner_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price_cents)
        .bind(new_product.discount_bps)
        .bind(new_product.sale_starts_at)
        .bind(new_product.sale_ends_at)
        .bind(new_product.stock)
        .bind(&new_product.category)
        .bind(&new_product.brand)
        .bind(&new_product.image_url)
        .bind(new_product.owner_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            name: new_product.name,
            description: new_product.description,
            price_cents: new_product.price_cents,
            discount_bps: new_product.discount_bps,
            sale_starts_at: new_product.sale_starts_at,
            sale_ends_at: new_product.sale_ends_at,
            stock: new_product.stock,
            is_active: true,
            category: new_product.category,
            brand: new_product.brand,
            image_url: new_product.image_url,
            owner_id: new_product.owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by ID (active or not).
    ///
    /// Inactive products stay fetchable so order history can still
    /// resolve their details; listings filter on `is_active` instead.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
            ORDER BY created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products.
    ///
    /// Unset filter fields match everything, so `ProductFilter::default()`
    /// is an active-products listing ordered by name.
    pub async fn search(&self, filter: &ProductFilter, limit: i64) -> DbResult<Vec<Product>> {
        debug!(?filter, "Searching products");

        let pattern = filter.name.as_deref().map(|q| format!("%{}%", q));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (?1 IS NULL OR name LIKE ?1)
              AND (?2 IS NULL OR category = ?2)
              AND (?3 IS NULL OR brand = ?3)
              AND (?4 IS NULL OR price_cents >= ?4)
              AND (?5 IS NULL OR price_cents <= ?5)
            ORDER BY name
            LIMIT ?6
            "#
        ))
        .bind(pattern)
        .bind(filter.category.as_deref())
        .bind(filter.brand.as_deref())
        .bind(filter.min_price_cents)
        .bind(filter.max_price_cents)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products whose discount window contains `now`.
    ///
    /// Mirrors `bazaar_core::pricing::is_on_sale`: positive discount, start
    /// inclusive, end exclusive, missing bounds unbounded.
    pub async fn list_on_sale(&self, now: DateTime<Utc>, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND discount_bps IS NOT NULL AND discount_bps > 0
              AND (sale_starts_at IS NULL OR sale_starts_at <= ?1)
              AND (sale_ends_at IS NULL OR sale_ends_at > ?1)
            ORDER BY discount_bps DESC
            LIMIT ?2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists every product belonging to a seller, including inactive ones.
    pub async fn list_by_owner(&self, owner_id: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE owner_id = ?1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's mutable fields.
    ///
    /// Ownership and role checks happen at the policy layer before this
    /// is called; the repository writes unconditionally.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                discount_bps = ?5,
                sale_starts_at = ?6,
                sale_ends_at = ?7,
                stock = ?8,
                category = ?9,
                brand = ?10,
                image_url = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.discount_bps)
        .bind(product.sale_starts_at)
        .bind(product.sale_ends_at)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(&product.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id.to_string()));
        }

        Ok(())
    }

    /// Counts all products (active and inactive).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Soft-deletes a product (hides it from listings).
    ///
    /// The row survives so existing order lines keep a valid reference.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id.to_string()));
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
    use crate::repository::user::NewUser;
    use bazaar_core::Role;
    use chrono::{Duration, TimeZone};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_seller(db: &Database) -> i64 {
        db.users()
            .create(NewUser {
                user_name: "Seller".to_string(),
                email: "seller@example.com".to_string(),
                phone_number: "0123456789".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Seller,
            })
            .await
            .unwrap()
            .id
    }

    fn new_product(owner_id: i64, name: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
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
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_db().await;
        let seller = seed_seller(&db).await;

        let product = db
            .products()
            .insert(new_product(seller, "Widget", 1099, 10))
            .await
            .unwrap();

        assert!(product.id > 0);
        assert!(product.is_active);

        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(fetched.price_cents, 1099);
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.owner_id, seller);
    }

    #[tokio::test]
    async fn test_search_by_name_and_category() {
        let db = test_db().await;
        let seller = seed_seller(&db).await;

        db.products()
            .insert(new_product(seller, "Trail Backpack", 4999, 5))
            .await
            .unwrap();
        let mut other = new_product(seller, "City Backpack", 3999, 5);
        other.category = "urban".to_string();
        db.products().insert(other).await.unwrap();
        db.products()
            .insert(new_product(seller, "Water Bottle", 999, 5))
            .await
            .unwrap();

        let by_name = ProductFilter {
            name: Some("backpack".to_string()),
            ..Default::default()
        };
        let hits = db.products().search(&by_name, 20).await.unwrap();
        assert_eq!(hits.len(), 2);

        let urban = db
            .products()
            .search(
                &ProductFilter {
                    name: Some("backpack".to_string()),
                    category: Some("urban".to_string()),
                    ..Default::default()
                },
                20,
            )
            .await
            .unwrap();
        assert_eq!(urban.len(), 1);
        assert_eq!(urban[0].name, "City Backpack");

        let none = db
            .products()
            .search(
                &ProductFilter {
                    name: Some("kayak".to_string()),
                    ..Default::default()
                },
                20,
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_brand_and_price_range() {
        let db = test_db().await;
        let seller = seed_seller(&db).await;

        let mut cheap = new_product(seller, "Mini Lamp", 1500, 5);
        cheap.brand = "Lumen".to_string();
        db.products().insert(cheap).await.unwrap();

        let mut pricey = new_product(seller, "Studio Lamp", 8900, 5);
        pricey.brand = "Lumen".to_string();
        db.products().insert(pricey).await.unwrap();

        db.products()
            .insert(new_product(seller, "Desk Fan", 2500, 5))
            .await
            .unwrap();

        let lumen = db
            .products()
            .search(
                &ProductFilter {
                    brand: Some("Lumen".to_string()),
                    ..Default::default()
                },
                20,
            )
            .await
            .unwrap();
        assert_eq!(lumen.len(), 2);

        let mid_range = db
            .products()
            .search(
                &ProductFilter {
                    min_price_cents: Some(1000),
                    max_price_cents: Some(3000),
                    ..Default::default()
                },
                20,
            )
            .await
            .unwrap();
        let names: Vec<&str> = mid_range.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Desk Fan", "Mini Lamp"]);
    }

    #[tokio::test]
    async fn test_list_on_sale_respects_window() {
        let db = test_db().await;
        let seller = seed_seller(&db).await;
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();

        // Active sale
        let mut active = new_product(seller, "On Sale", 1000, 5);
        active.discount_bps = Some(2000);
        active.sale_starts_at = Some(now - Duration::days(1));
        active.sale_ends_at = Some(now + Duration::days(1));
        db.products().insert(active).await.unwrap();

        // Expired sale: window ended exactly at `now` (end is exclusive)
        let mut expired = new_product(seller, "Expired Sale", 1000, 5);
        expired.discount_bps = Some(3000);
        expired.sale_ends_at = Some(now);
        db.products().insert(expired).await.unwrap();

        // Discount with no window: always on sale
        let mut always = new_product(seller, "Always On Sale", 1000, 5);
        always.discount_bps = Some(1000);
        db.products().insert(always).await.unwrap();

        // No discount at all
        db.products()
            .insert(new_product(seller, "Full Price", 1000, 5))
            .await
            .unwrap();

        let on_sale = db.products().list_on_sale(now, 20).await.unwrap();
        let names: Vec<&str> = on_sale.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"On Sale"));
        assert!(names.contains(&"Always On Sale"));
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = test_db().await;
        let seller = seed_seller(&db).await;

        let mut product = db
            .products()
            .insert(new_product(seller, "Widget", 1099, 10))
            .await
            .unwrap();

        product.price_cents = 1299;
        product.stock = 7;
        db.products().update(&product).await.unwrap();

        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.price_cents, 1299);
        assert_eq!(fetched.stock, 7);

        db.products().soft_delete(product.id).await.unwrap();

        // Hidden from listings but still fetchable by id
        let listed = db.products().list(20, 0).await.unwrap();
        assert!(listed.is_empty());
        let fetched = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);

        // Deleting twice is a NotFound
        let err = db.products().soft_delete(product.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
