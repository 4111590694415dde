//! # Access Policy Module
//!
//! Role-based access rules as pure functions.
//!
//! ## Policy Matrix
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation              │ Customer      │ Seller          │ Admin       │
//! │  ───────────────────────┼───────────────┼─────────────────┼──────────── │
//! │  place order            │ ✅            │ ❌              │ ❌          │
//! │  use a cart             │ ✅            │ ❌              │ ❌          │
//! │  keep addresses         │ ✅            │ ❌              │ ❌          │
//! │  create product         │ ❌            │ ✅              │ ✅          │
//! │  modify/delete product  │ ❌            │ own only        │ ✅ any      │
//! │  view orders            │ own           │ containing own  │ ✅ all      │
//! │                         │               │ products        │             │
//! │  update order status    │ ❌            │ related only    │ ✅ any      │
//! │  cancel order           │ own, pending/ │ ❌              │ ✅ any,     │
//! │                         │ processing    │                 │ same guard  │
//! │ ────────────────────────┴───────────────┴─────────────────┴──────────── │
//! │                                                                         │
//! │  Every rule is an exhaustive match on Role: adding a role forces a      │
//! │  decision at every rule site.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design
//! Functions come in pairs: a `can_*` predicate for branching and an
//! `ensure_*` checker that returns `Err(CoreError::Forbidden)` for the
//! common deny-with-error path. Callers in the transport layer use the
//! `ensure_*` forms with `?`.

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus, Role};

// =============================================================================
// Order Visibility
// =============================================================================

/// What slice of the order table a role may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderVisibility {
    /// Only orders the user placed.
    Own,
    /// Only orders containing at least one product the user owns.
    RelatedProducts,
    /// Every order.
    All,
}

/// Returns the order visibility scope for a role.
pub fn order_visibility(role: Role) -> OrderVisibility {
    match role {
        Role::Customer => OrderVisibility::Own,
        Role::Seller => OrderVisibility::RelatedProducts,
        Role::Admin => OrderVisibility::All,
    }
}

// =============================================================================
// Cart & Order Placement
// =============================================================================

/// Whether a role may own a cart and place orders.
///
/// Only customers shop; sellers and admins interact with the catalog and
/// fulfilment sides instead.
pub fn can_place_order(role: Role) -> bool {
    match role {
        Role::Customer => true,
        Role::Seller => false,
        Role::Admin => false,
    }
}

/// Ensures the role may place orders (and, equivalently, mutate a cart).
pub fn ensure_can_place_order(role: Role) -> CoreResult<()> {
    if can_place_order(role) {
        Ok(())
    } else {
        Err(CoreError::forbidden("only customers can place orders"))
    }
}

/// Whether a role may keep a shipping address book.
///
/// Addresses exist to receive orders, so they follow the same ownership
/// rule as carts and order placement.
pub fn can_manage_addresses(role: Role) -> bool {
    can_place_order(role)
}

/// Ensures the role may create or edit shipping addresses.
pub fn ensure_can_manage_addresses(role: Role) -> CoreResult<()> {
    if can_manage_addresses(role) {
        Ok(())
    } else {
        Err(CoreError::forbidden(
            "only customers keep shipping addresses",
        ))
    }
}

// =============================================================================
// Product Management
// =============================================================================

/// Whether a role may create products.
pub fn can_create_product(role: Role) -> bool {
    match role {
        Role::Customer => false,
        Role::Seller => true,
        Role::Admin => true,
    }
}

/// Ensures the role may create products.
pub fn ensure_can_create_product(role: Role) -> CoreResult<()> {
    if can_create_product(role) {
        Ok(())
    } else {
        Err(CoreError::forbidden("only sellers can create products"))
    }
}

/// Whether a user may modify or delete a specific product.
///
/// Sellers are scoped to their own listings; admins may touch any product.
pub fn can_modify_product(role: Role, user_id: i64, product_owner_id: i64) -> bool {
    match role {
        Role::Customer => false,
        Role::Seller => user_id == product_owner_id,
        Role::Admin => true,
    }
}

/// Ensures the user may modify the product.
pub fn ensure_can_modify_product(role: Role, user_id: i64, product_owner_id: i64) -> CoreResult<()> {
    if can_modify_product(role, user_id, product_owner_id) {
        Ok(())
    } else {
        Err(CoreError::forbidden(
            "only the owning seller or an admin can modify this product",
        ))
    }
}

// =============================================================================
// Order Access
// =============================================================================

/// Whether a user may view a specific order.
///
/// ## Arguments
/// * `is_seller_related` - Whether the order contains at least one product
///   the user owns (the caller resolves this against storage)
pub fn can_view_order(
    role: Role,
    user_id: i64,
    order_user_id: i64,
    is_seller_related: bool,
) -> bool {
    match role {
        Role::Customer => user_id == order_user_id,
        Role::Seller => is_seller_related,
        Role::Admin => true,
    }
}

/// Ensures the user may view the order.
///
/// Denies with `NotFound` rather than `Forbidden` so the response does not
/// leak whether the order id exists.
pub fn ensure_can_view_order(
    role: Role,
    user_id: i64,
    order: &Order,
    is_seller_related: bool,
) -> CoreResult<()> {
    if can_view_order(role, user_id, order.user_id, is_seller_related) {
        Ok(())
    } else {
        Err(CoreError::not_found("Order", order.id))
    }
}

/// Whether a user may update an order's status.
///
/// Sellers may move orders along the fulfilment pipeline, but only orders
/// containing their own products. Customers never drive status directly;
/// they go through cancellation.
pub fn can_update_order_status(role: Role, is_seller_related: bool) -> bool {
    match role {
        Role::Customer => false,
        Role::Seller => is_seller_related,
        Role::Admin => true,
    }
}

/// Ensures the user may update the order's status.
pub fn ensure_can_update_order_status(role: Role, is_seller_related: bool) -> CoreResult<()> {
    if can_update_order_status(role, is_seller_related) {
        Ok(())
    } else {
        Err(CoreError::forbidden(
            "only a related seller or an admin can update order status",
        ))
    }
}

/// Whether a user may cancel a specific order.
///
/// Cancellation belongs to the buyer (their own orders) and to admins.
/// Sellers use the status pipeline instead.
pub fn can_cancel_order(role: Role, user_id: i64, order_user_id: i64) -> bool {
    match role {
        Role::Customer => user_id == order_user_id,
        Role::Seller => false,
        Role::Admin => true,
    }
}

/// Ensures the user may cancel the order, then that the order's status
/// still allows it.
///
/// Both checks live here so every cancellation path applies them in the
/// same sequence: authorization first, state second.
pub fn ensure_can_cancel_order(role: Role, user_id: i64, order: &Order) -> CoreResult<()> {
    if !can_cancel_order(role, user_id, order.user_id) {
        return Err(CoreError::forbidden(
            "only the buyer or an admin can cancel this order",
        ));
    }
    ensure_cancellable(order)
}

/// Ensures the order's current status allows cancellation.
pub fn ensure_cancellable(order: &Order) -> CoreResult<()> {
    if order.status.is_cancellable() {
        Ok(())
    } else {
        Err(CoreError::NotCancellable {
            order_id: order.id,
            current: order.status,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
