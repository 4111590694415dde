//! # Route Layer
//!
//! HTTP surface of the Bazaar server.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Public                                                                 │
//! │    GET  /health                       liveness + db check               │
//! │    POST /auth/register                create an account                 │
//! │    POST /auth/login                   email + password → JWT            │
//! │    GET  /products                     browse catalog                    │
//! │    GET  /products/search              name/category search              │
//! │    GET  /products/on-sale             active discount windows           │
//! │    GET  /products/:id                 product detail                    │
//! │                                                                         │
//! │  Authenticated (Bearer token)                                           │
//! │    GET    /users/me                   caller's profile                  │
//! │    GET    /users                      all accounts (admin)              │
//! │    DELETE /users/:id                  deactivate account (admin)        │
//! │    POST   /products                   list a product (seller/admin)     │
//! │    GET    /products/mine              seller's own listings             │
//! │    PUT    /products/:id               edit (owner/admin)                │
//! │    DELETE /products/:id               soft delete (owner/admin)         │
//! │    GET    /cart                       lines + estimated total           │
//! │    POST   /cart/items                 add/merge a line                  │
//! │    PUT    /cart/items/:id             set absolute quantity             │
//! │    DELETE /cart/items/:id             drop a line                       │
//! │    DELETE /cart                       clear                             │
//! │    GET    /addresses                  address book                      │
//! │    POST   /addresses                  add address                       │
//! │    PUT    /addresses/:id              edit address                      │
//! │    DELETE /addresses/:id              delete (unless order-referenced)  │
//! │    POST   /orders                     checkout the cart                 │
//! │    GET    /orders                     role-scoped listing               │
//! │    GET    /orders/:id                 detail with lines                 │
//! │    PATCH  /orders/:id/status          fulfilment pipeline               │
//! │    POST   /orders/:id/cancel          cancel + restock                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod addresses;
pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use axum::extract::State;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/register", post(users::register))
        .route("/auth/login", post(users::login))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list))
        .route("/users/:id", delete(users::deactivate))
        // Catalog
        .route("/products", get(products::list).post(products::create))
        .route("/products/search", get(products::search))
        .route("/products/on-sale", get(products::on_sale))
        .route("/products/mine", get(products::mine))
        .route(
            "/products/:id",
            get(products::get).put(products::update).delete(products::remove),
        )
        // Cart
        .route("/cart", get(carts::get).delete(carts::clear))
        .route("/cart/items", post(carts::add_item))
        .route(
            "/cart/items/:id",
            put(carts::update_item).delete(carts::remove_item),
        )
        // Address book
        .route("/addresses", get(addresses::list).post(addresses::create))
        .route(
            "/addresses/:id",
            put(addresses::update).delete(addresses::remove),
        )
        // Orders
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/orders/:id/cancel", post(orders::cancel))
        .with_state(state)
}

/// Liveness endpoint including a database round-trip.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = if state.db.health_check().await {
        "up"
    } else {
        "down"
    };

    let migrations = match bazaar_db::migrations::migration_status(state.db.pool()).await {
        Ok((total, applied)) => json!({ "total": total, "applied": applied }),
        Err(_) => json!(null),
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "migrations": migrations,
    }))
}
