//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What clients see (HTTP status + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to exactly one HTTP status at the transport layer

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The transport layer translates them to user-facing responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity cannot be found, or exists but is not owned by the caller.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist in the database
    /// - A shipping address or cart line belongs to a different user
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Insufficient stock to satisfy a cart mutation or order creation.
    ///
    /// ## When This Occurs
    /// - Adding more to a cart than the product has in stock
    /// - Order validate phase finds stock < requested quantity
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// OutOfStock { product_id: 7, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Client shows: "Only 3 left in stock"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    OutOfStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Order is not in a status that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling an order that is already shipped, delivered, or cancelled
    #[error("Cannot cancel order {order_id} with status {current:?}: only pending or processing orders can be cancelled")]
    NotCancellable {
        order_id: i64,
        current: OrderStatus,
    },

    /// Order creation was attempted against an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The caller's role or ownership does not permit the operation.
    ///
    /// ## When This Occurs
    /// - A seller placing an order
    /// - A customer viewing another customer's order
    /// - A seller mutating a product they do not own
    #[error("Forbidden: {reason}")]
    Forbidden { reason: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }

    /// Creates a Forbidden error with a static reason.
    pub fn forbidden(reason: &'static str) -> Self {
        CoreError::Forbidden { reason }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Invalid format (e.g., malformed phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
