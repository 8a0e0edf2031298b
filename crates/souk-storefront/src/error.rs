//! # Storefront Error Type
//!
//! Unified error type for storefront operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Souk                                   │
//! │                                                                         │
//! │  CartError (souk-core) ────────┐                                       │
//! │  InvalidStatus (souk-core) ────┤                                       │
//! │  DbError (souk-db) ────────────┼──► StorefrontError ──► caller         │
//! │  Vec<Violation> (checkout) ────┘         │                             │
//! │                                          ▼                             │
//! │                               ErrorCode (machine readable)             │
//! │                                                                         │
//! │  Cart mutation errors: one user-facing notice per call.                │
//! │  Checkout validation errors: collected, surfaced as one Aborted batch. │
//! │  Unexpected persistence faults: logged with context, reported as a     │
//! │  generic CheckoutFailed - never a partial order, never silently        │
//! │  retried.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use souk_core::{CartError, InvalidStatus, Violation};
use souk_db::DbError;

/// Renders a violation batch as one aggregated, user-facing sentence.
fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Storefront Error
// =============================================================================

/// What a storefront operation can fail with.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Product, order or order line absent (or hidden from this principal).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A cart mutation rule fired (sold out, insufficient stock,
    /// self-purchase, not in cart).
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Checkout on a cart that is empty after sanitation.
    #[error("your cart is empty")]
    EmptyCart,

    /// The cart outlived its TTL; it has been cleared and the timestamp
    /// reset. Surfaced exactly once per expiry.
    #[error("your cart expired and has been cleared")]
    CartExpired,

    /// An order-line status outside the enumerated set.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    /// The principal may not perform this operation.
    #[error("you do not have permission to perform this action")]
    PermissionDenied,

    /// Lock contention during checkout; retry by resubmitting.
    #[error("the store is busy, please try again")]
    Busy,

    /// Checkout validation failed; every offending line is listed so the
    /// user gets a single complete correction list.
    #[error("checkout aborted: {}", format_violations(.violations))]
    Aborted { violations: Vec<Violation> },

    /// An unexpected fault during commit. The transaction rolled back; the
    /// details are in the log, not in this message.
    #[error("could not complete checkout, please try again")]
    CheckoutFailed,

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error codes for API callers.
///
/// ## Usage
/// The code is what callers branch on (e.g. map `NotFound`/`NotInCart` to
/// HTTP 404, `Busy` to 503 + Retry-After, `Aborted` to 409); the Display
/// message is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    SoldOut,
    InsufficientStock,
    SelfPurchase,
    NotInCart,
    InvalidQuantity,
    EmptyCart,
    CartExpired,
    InvalidStatus,
    PermissionDenied,
    Busy,
    Aborted,
    CheckoutFailed,
    Storage,
}

impl StorefrontError {
    /// The machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            StorefrontError::NotFound { .. } => ErrorCode::NotFound,
            StorefrontError::Cart(CartError::SoldOut { .. }) => ErrorCode::SoldOut,
            StorefrontError::Cart(CartError::InsufficientStock { .. }) => {
                ErrorCode::InsufficientStock
            }
            StorefrontError::Cart(CartError::SelfPurchase { .. }) => ErrorCode::SelfPurchase,
            StorefrontError::Cart(CartError::NotInCart(_)) => ErrorCode::NotInCart,
            StorefrontError::Cart(CartError::InvalidQuantity(_)) => ErrorCode::InvalidQuantity,
            StorefrontError::EmptyCart => ErrorCode::EmptyCart,
            StorefrontError::CartExpired => ErrorCode::CartExpired,
            StorefrontError::InvalidStatus(_) => ErrorCode::InvalidStatus,
            StorefrontError::PermissionDenied => ErrorCode::PermissionDenied,
            StorefrontError::Busy => ErrorCode::Busy,
            StorefrontError::Aborted { .. } => ErrorCode::Aborted,
            StorefrontError::CheckoutFailed => ErrorCode::CheckoutFailed,
            StorefrontError::Storage(_) => ErrorCode::Storage,
        }
    }
}

/// Storage errors outside checkout keep their detail; `Busy` stays
/// distinguishable so callers can offer a retry.
impl From<DbError> for StorefrontError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy => StorefrontError::Busy,
            other => StorefrontError::Storage(other.to_string()),
        }
    }
}

/// Result type for storefront operations.
pub type StorefrontResult<T> = Result<T, StorefrontError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_message_aggregates_violations() {
        let err = StorefrontError::Aborted {
            violations: vec![
                Violation::Unavailable { product_id: 9 },
                Violation::InsufficientStock {
                    product_id: 4,
                    name: "Rug".to_string(),
                    available: 2,
                    requested: 3,
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "checkout aborted: product 9 is no longer available; \
             insufficient stock for Rug: available 2, requested 3"
        );
        assert_eq!(err.code(), ErrorCode::Aborted);
    }

    #[test]
    fn test_busy_is_distinguishable() {
        let err: StorefrontError = DbError::Busy.into();
        assert_eq!(err.code(), ErrorCode::Busy);

        let err: StorefrontError = DbError::Internal("boom".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Storage);
    }

    #[test]
    fn test_cart_error_codes() {
        let err: StorefrontError = CartError::NotInCart(5).into();
        assert_eq!(err.code(), ErrorCode::NotInCart);

        let err: StorefrontError = CartError::SoldOut {
            name: "Lamp".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::SoldOut);
    }
}
