//! # Pricing Module
//!
//! Computes the **effective unit price** of a product: the price a buyer
//! actually pays after any active percentage discount.
//!
//! ## The Two Price Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Product.price_cents (base)                                            │
//! │        │                                                                │
//! │        ├──► Cart total ──────────────── uses BASE price (estimate)     │
//! │        │                                                                │
//! │        └──► effective_unit_price(now) ─ uses DISCOUNTED price          │
//! │                  │                                                      │
//! │                  └──► OrderLine.unit_price_cents (frozen snapshot)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart total is a pre-checkout estimate over base prices; the order
//! workflow is the only place discounted prices are computed and persisted.
//!
//! ## Sale Window Semantics
//! A discount applies only while `now` falls inside the half-open window
//! `[sale_starts_at, sale_ends_at)`. A missing bound is unbounded on that
//! side; a product with a discount but no window is always on sale.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::Product;

// =============================================================================
// Sale Window
// =============================================================================

/// Checks whether a product's discount is active at `now`.
///
/// ## Window Rules
/// - start bound is inclusive, end bound is exclusive: `[start, end)`
/// - `None` start = active since forever; `None` end = never expires
/// - A product without a positive `discount_bps` is never on sale,
///   regardless of its window
///
/// ## Example
/// ```rust
/// use bazaar_core::pricing::is_on_sale;
/// # use bazaar_core::types::Product;
/// # use chrono::{TimeZone, Utc};
/// # let product = Product {
/// #     id: 1, name: "X".into(), description: None, price_cents: 1000,
/// #     discount_bps: Some(2000),
/// #     sale_starts_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
/// #     sale_ends_at: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
/// #     stock: 10, is_active: true, category: "c".into(), brand: "b".into(),
/// #     image_url: None, owner_id: 1,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let inside = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
/// assert!(is_on_sale(&product, inside));
///
/// // The end instant itself is outside the window.
/// let at_end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
/// assert!(!is_on_sale(&product, at_end));
/// ```
pub fn is_on_sale(product: &Product, now: DateTime<Utc>) -> bool {
    let Some(rate) = product.discount() else {
        return false;
    };
    if rate.is_zero() {
        return false;
    }
    if let Some(start) = product.sale_starts_at {
        if now < start {
            return false;
        }
    }
    if let Some(end) = product.sale_ends_at {
        if now >= end {
            return false;
        }
    }
    true
}

// =============================================================================
// Effective Unit Price
// =============================================================================

/// Computes the effective unit price of a product at `now`.
///
/// Returns the discounted price while the sale window is active, the base
/// price otherwise. This is the value the order workflow snapshots into
/// `OrderLine.unit_price_cents`.
///
/// ## Arguments
/// * `product` - The product to price
/// * `now` - The instant to evaluate the sale window against (injected so
///   the function stays pure and testable)
///
/// ## Example
/// ```rust
/// use bazaar_core::pricing::effective_unit_price;
/// # use bazaar_core::types::Product;
/// # use chrono::Utc;
/// # let product = Product {
/// #     id: 1, name: "X".into(), description: None, price_cents: 10000,
/// #     discount_bps: Some(2000), sale_starts_at: None, sale_ends_at: None,
/// #     stock: 10, is_active: true, category: "c".into(), brand: "b".into(),
/// #     image_url: None, owner_id: 1,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// // $100.00 at 20% off = $80.00
/// assert_eq!(effective_unit_price(&product, Utc::now()).cents(), 8000);
/// ```
pub fn effective_unit_price(product: &Product, now: DateTime<Utc>) -> Money {
    let base = product.price();
    if !is_on_sale(product, now) {
        return base;
    }
    match product.discount() {
        Some(rate) => base.apply_percentage_discount(rate.bps()),
        None => base,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
