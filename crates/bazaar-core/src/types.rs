//! # Domain Types
//!
//! Core domain types used throughout Bazaar.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  quantity       │       │
//! │  │  discount_bps   │   │  total_cents    │   │  unit_price ❄   │       │
//! │  │  stock          │   │  address (FK)   │   │  (frozen)       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │   OrderStatus   │   │      Role       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Customer       │       │
//! │  │  2000 = 20%     │   │  Processing     │   │  Seller         │       │
//! │  └─────────────────┘   │  Shipped        │   │  Admin          │       │
//! │                        │  Delivered      │   └─────────────────┘       │
//! │                        │  Cancelled      │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a database-assigned integer id. Relations are
//! explicit foreign keys; there is no live object graph between entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The role of an authenticated user.
///
/// Modeled as a closed enum so access policy functions can match
/// exhaustively; a new role cannot be added without the compiler pointing
/// at every rule that must consider it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shops: owns a cart, places orders, manages an address book.
    Customer,
    /// Lists products and fulfils orders containing them.
    Seller,
    /// Unrestricted.
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Lifecycle
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │             │
///    └─────────────┴──► cancelled (restocks all lines)
/// ```
///
/// Note: `update_status` performs a permissive write (any status may
/// overwrite any other); only cancellation is guarded. See DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether an order in this status may still be cancelled.
    ///
    /// Cancellation restocks every line, so it is only allowed before the
    /// order leaves the warehouse.
    #[inline]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000.
/// 2000 bps = 20%. Fractional percentages (12.5% = 1250 bps) stay exact
/// without floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks if the rate is zero (no discount).
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user.
///
/// The password hash never leaves the database layer; API responses use
/// a separate DTO in the server crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    /// Exactly 10 digits, unique.
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product listed by a seller.
///
/// Stock is mutated only by the order workflow (debit on creation, credit
/// on cancellation) and by explicit owner/admin edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    pub name: String,

    pub description: Option<String>,

    /// Base price in cents. Always > 0.
    pub price_cents: i64,

    /// Percentage discount in basis points (2000 = 20%).
    /// `None` or zero means no discount.
    pub discount_bps: Option<i64>,

    /// Start of the sale window (inclusive). `None` = no lower bound.
    pub sale_starts_at: Option<DateTime<Utc>>,

    /// End of the sale window (exclusive). `None` = no upper bound.
    pub sale_ends_at: Option<DateTime<Utc>>,

    /// Units available. Never negative.
    pub stock: i64,

    /// Soft-delete flag: inactive products are hidden from listings but
    /// keep their order history intact.
    pub is_active: bool,

    pub category: String,

    pub brand: String,

    pub image_url: Option<String>,

    /// The seller who listed this product.
    pub owner_id: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the discount rate, if one is configured and positive.
    pub fn discount(&self) -> Option<DiscountRate> {
        match self.discount_bps {
            Some(bps) if bps > 0 => Some(DiscountRate::from_bps(bps as u32)),
            _ => None,
        }
    }

    /// Checks whether `stock` can satisfy the requested quantity.
    #[inline]
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A user's cart. One per user, created lazily on the first add.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
}

/// One product+quantity entry in a cart.
///
/// Lines are unique per (cart, product): adding the same product again
/// merges quantities instead of creating a second line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    /// Always > 0 and never above the product's stock at mutation time.
    pub quantity: i64,
}

// =============================================================================
// Shipping Address
// =============================================================================

/// A shipping address belonging to exactly one user.
///
/// Orders reference the address row rather than copying it; the schema
/// forbids deleting an address that any order references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShippingAddress {
    pub id: i64,
    pub user_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// An order header.
///
/// `total_cents` is fixed at creation time: the sum over lines of the
/// snapshotted unit price × quantity. It is never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub shipping_address_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// An immutable line of an order.
///
/// ## Snapshot Pattern
/// `unit_price_cents` is the effective (discounted) unit price at the
/// moment the order was created. Later product price changes never affect
/// existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Effective unit price at order time (frozen).
    pub unit_price_cents: i64,
}

impl OrderLine {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
