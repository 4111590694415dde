//! Cart routes.
//!
//! All endpoints require a customer account; sellers and admins shop
//! through customer accounts, not their operational ones. The total in
//! the cart view is an estimate over base prices; checkout applies and
//! freezes discounts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bazaar_core::{policy, CartLine};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// `GET /cart`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CartView>, ApiError> {
    policy::ensure_can_place_order(user.role)?;

    let lines = state.db.carts().get_lines(user.id).await?;
    let total = state.db.carts().total(user.id).await?;

    Ok(Json(CartView {
        lines,
        total_cents: total.cents(),
    }))
}

/// `POST /cart/items`
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartLine>), ApiError> {
    policy::ensure_can_place_order(user.role)?;

    let line = state
        .db
        .carts()
        .add_line(user.id, req.product_id, req.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(line)))
}

/// `PUT /cart/items/:id`
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartLine>, ApiError> {
    policy::ensure_can_place_order(user.role)?;

    let line = state
        .db
        .carts()
        .update_line(user.id, line_id, req.quantity)
        .await?;

    Ok(Json(line))
}

/// `DELETE /cart/items/:id`
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    policy::ensure_can_place_order(user.role)?;

    state.db.carts().remove_line(user.id, line_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /cart`
pub async fn clear(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    policy::ensure_can_place_order(user.role)?;

    state.db.carts().clear(user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
