//! Catalog routes: browse, search, and seller CRUD.
//!
//! Read endpoints are public; mutations go through the access policy
//! (sellers touch only their own listings, admins touch anything).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use bazaar_core::{policy, validation, Product};
use bazaar_db::repository::product::{NewProduct, ProductFilter};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Name substring; empty matches everything.
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub limit: Option<i64>,
}

/// Payload for both create and full update.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
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
}

impl ProductPayload {
    fn validate(&self) -> Result<(), ApiError> {
        validation::validate_product_name(&self.name)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        validation::validate_price_cents(self.price_cents)
            .map_err(|e| ApiError::validation(e.to_string()))?;
        validation::validate_stock(self.stock).map_err(|e| ApiError::validation(e.to_string()))?;
        if let Some(bps) = self.discount_bps {
            validation::validate_discount_bps(bps)
                .map_err(|e| ApiError::validation(e.to_string()))?;
        }
        if let (Some(start), Some(end)) = (self.sale_starts_at, self.sale_ends_at) {
            if start >= end {
                return Err(ApiError::validation("sale window must end after it starts"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Public Handlers
// =============================================================================

/// `GET /products`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let products = state.db.products().list(limit, offset).await?;
    Ok(Json(products))
}

/// `GET /products/search`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let query =
        validation::validate_search_query(&params.q).map_err(|e| ApiError::validation(e.to_string()))?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let filter = ProductFilter {
        name: (!query.is_empty()).then_some(query),
        category: params.category,
        brand: params.brand,
        min_price_cents: params.min_price_cents,
        max_price_cents: params.max_price_cents,
    };

    let products = state.db.products().search(&filter, limit).await?;
    Ok(Json(products))
}

/// `GET /products/on-sale`
pub async fn on_sale(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let products = state.db.products().list_on_sale(Utc::now(), limit).await?;
    Ok(Json(products))
}

/// `GET /products/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(product))
}

// =============================================================================
// Seller/Admin Handlers
// =============================================================================

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    policy::ensure_can_create_product(user.role)?;
    payload.validate()?;

    let product = state
        .db
        .products()
        .insert(NewProduct {
            name: payload.name,
            description: payload.description,
            price_cents: payload.price_cents,
            discount_bps: payload.discount_bps,
            sale_starts_at: payload.sale_starts_at,
            sale_ends_at: payload.sale_ends_at,
            stock: payload.stock,
            category: payload.category,
            brand: payload.brand,
            image_url: payload.image_url,
            owner_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/mine`
pub async fn mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    policy::ensure_can_create_product(user.role)?;

    let products = state.db.products().list_by_owner(user.id).await?;
    Ok(Json(products))
}

/// `PUT /products/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>, ApiError> {
    let mut product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    policy::ensure_can_modify_product(user.role, user.id, product.owner_id)?;
    payload.validate()?;

    product.name = payload.name;
    product.description = payload.description;
    product.price_cents = payload.price_cents;
    product.discount_bps = payload.discount_bps;
    product.sale_starts_at = payload.sale_starts_at;
    product.sale_ends_at = payload.sale_ends_at;
    product.stock = payload.stock;
    product.category = payload.category;
    product.brand = payload.brand;
    product.image_url = payload.image_url;

    state.db.products().update(&product).await?;

    Ok(Json(product))
}

/// `DELETE /products/:id`
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    policy::ensure_can_modify_product(user.role, user.id, product.owner_id)?;

    state.db.products().soft_delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
