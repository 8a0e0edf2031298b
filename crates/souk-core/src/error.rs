//! # Error Types
//!
//! Domain-specific error types for souk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  souk-core errors (this file)                                          │
//! │  ├── CartError       - Cart mutation failures (per call)               │
//! │  ├── Violation       - One offending checkout line (collected)         │
//! │  ├── InvalidStatus   - Unknown order-line status value                 │
//! │  └── MoneyError      - Unparseable monetary value                      │
//! │                                                                         │
//! │  souk-db errors (separate crate)                                       │
//! │  └── DbError         - Storage failures, incl. Busy on lock waits      │
//! │                                                                         │
//! │  souk-storefront errors (separate crate)                               │
//! │  └── StorefrontError - What API callers see, with an ErrorCode         │
//! │                                                                         │
//! │  Flow: CartError/Violation → StorefrontError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available stock)
//! 3. Errors are enum variants, never bare Strings
//! 4. Checkout validation failures are *collected*, not short-circuited

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// A cart mutation failure.
///
/// Surfaced one per call: each cart operation either succeeds or reports a
/// single user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Live stock is zero; nothing can be added.
    #[error("{name} is sold out")]
    SoldOut { name: String },

    /// The requested total would exceed live stock.
    ///
    /// `requested` is the quantity the cart would have held, not the delta,
    /// so the message can say "you asked for 7, only 5 left".
    #[error("only {available} of {name} left in stock (requested {requested})")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A seller tried to put their own product in their cart.
    #[error("you cannot purchase your own product: {name}")]
    SelfPurchase { name: String },

    /// Increment/decrement on a line that is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(i64),

    /// A quantity that is neither auto-corrected nor usable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
}

// =============================================================================
// Checkout Violation
// =============================================================================

/// One offending line found while validating a cart against locked stock.
///
/// Checkout collects every violation in a single pass so the user gets one
/// complete correction list instead of iterative rejections. A non-empty
/// violation list aborts the whole transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// The product no longer exists or is no longer sellable.
    #[error("product {product_id} is no longer available")]
    Unavailable { product_id: i64 },

    /// Locked stock cannot cover the requested quantity.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The buyer owns this product (ownership may have changed since add).
    #[error("cannot purchase your own product: {name}")]
    SelfPurchase { product_id: i64, name: String },
}

impl Violation {
    /// The product the violation refers to.
    pub fn product_id(&self) -> i64 {
        match self {
            Violation::Unavailable { product_id }
            | Violation::InsufficientStock { product_id, .. }
            | Violation::SelfPurchase { product_id, .. } => *product_id,
        }
    }
}

// =============================================================================
// Scalar Errors
// =============================================================================

/// An order-line status string outside the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid status: {0}")]
pub struct InvalidStatus(pub String);

/// A monetary value that could not be parsed as a decimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid money value: {0}")]
pub struct MoneyError(pub String);

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_messages() {
        let err = CartError::InsufficientStock {
            name: "Walnut Desk".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "only 3 of Walnut Desk left in stock (requested 5)"
        );

        let err = CartError::SoldOut {
            name: "Walnut Desk".to_string(),
        };
        assert_eq!(err.to_string(), "Walnut Desk is sold out");
    }

    #[test]
    fn test_violation_product_id() {
        let v = Violation::Unavailable { product_id: 42 };
        assert_eq!(v.product_id(), 42);

        let v = Violation::SelfPurchase {
            product_id: 7,
            name: "Rug".to_string(),
        };
        assert_eq!(v.product_id(), 7);
    }

    #[test]
    fn test_invalid_status_message() {
        assert_eq!(
            InvalidStatus("teleported".to_string()).to_string(),
            "invalid status: teleported"
        );
    }
}
