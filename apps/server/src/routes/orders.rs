//! Order routes: checkout, listing, fulfilment, cancellation.
//!
//! Checkout converts the caller's cart into an order in a single
//! transaction; line prices are frozen at their effective (discounted)
//! value as of checkout. Listing is role-scoped: customers see their own
//! orders, sellers see orders containing their products, admins see all.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use bazaar_core::{policy, Order, OrderLine, OrderStatus, OrderVisibility};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::products::ListParams;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

/// An order together with its lines.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /orders`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>), ApiError> {
    policy::ensure_can_place_order(user.role)?;

    let (order, lines) = state
        .db
        .orders()
        .create_from_cart(user.id, req.shipping_address_id)
        .await?;

    info!(
        order_id = order.id,
        user_id = user.id,
        total_cents = order.total_cents,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(OrderDetail { order, lines })))
}

/// `GET /orders`
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = match policy::order_visibility(user.role) {
        OrderVisibility::Own => state.db.orders().list_for_user(user.id).await?,
        OrderVisibility::RelatedProducts => state.db.orders().list_for_seller(user.id).await?,
        OrderVisibility::All => {
            let limit = params.limit.unwrap_or(50).clamp(1, 200);
            let offset = params.offset.unwrap_or(0).max(0);
            state.db.orders().list_all(limit, offset).await?
        }
    };

    Ok(Json(orders))
}

/// `GET /orders/:id`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetail>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    let related = match user.role {
        bazaar_core::Role::Seller => state.db.orders().is_seller_related(id, user.id).await?,
        _ => false,
    };

    policy::ensure_can_view_order(user.role, user.id, &order, related)?;

    let lines = state.db.orders().get_lines(id).await?;

    Ok(Json(OrderDetail { order, lines }))
}

/// `PATCH /orders/:id/status`
///
/// Fulfilment pipeline only; cancellation goes through its own endpoint
/// because it restocks inventory.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    if req.status == OrderStatus::Cancelled {
        return Err(ApiError::validation(
            "use the cancel endpoint to cancel an order",
        ));
    }

    state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    let related = match user.role {
        bazaar_core::Role::Seller => state.db.orders().is_seller_related(id, user.id).await?,
        _ => false,
    };

    policy::ensure_can_update_order_status(user.role, related)?;

    let order = state.db.orders().update_status(id, req.status).await?;

    info!(order_id = id, status = ?order.status, "Order status updated");

    Ok(Json(order))
}

/// `POST /orders/:id/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))?;

    policy::ensure_can_cancel_order(user.role, user.id, &order)?;

    let cancelled = state.db.orders().cancel(id).await?;

    info!(order_id = id, user_id = user.id, "Order cancelled");

    Ok(Json(cancelled))
}
