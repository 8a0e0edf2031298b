//! # Validation Module
//!
//! Input normalization and validation for cart and order operations.
//!
//! Quantities arrive from the outside world as optional, possibly
//! non-numeric form fields. The policy is fixed in ONE place here so
//! entry points cannot drift apart:
//!
//! - `add`: missing, non-numeric or non-positive → coerced to 1
//! - `update`: parsed as-is; ≤ 0 is meaningful (it removes the line)
//! - `increment`/`decrement`: no quantity input at all
//!
//! ## Usage
//! ```rust
//! use souk_core::validation::{parse_quantity, quantity_to_add};
//!
//! assert_eq!(quantity_to_add(parse_quantity("3")), 3);
//! assert_eq!(quantity_to_add(parse_quantity("banana")), 1);
//! assert_eq!(quantity_to_add(None), 1);
//! ```

use crate::error::{CartError, InvalidStatus};
use crate::types::LineStatus;

// =============================================================================
// Quantity Normalization
// =============================================================================

/// Parses a raw quantity field. Returns `None` for non-numeric input.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Normalizes a quantity for `cart.add`.
///
/// Missing, non-numeric (already `None` after [`parse_quantity`]) and
/// non-positive values all become 1.
pub fn quantity_to_add(requested: Option<i64>) -> i64 {
    match requested {
        Some(qty) if qty > 0 => qty,
        _ => 1,
    }
}

/// Parses a quantity for `cart.update`, where nothing is auto-corrected:
/// ≤ 0 is a meaningful value (it removes the line), but non-numeric input
/// is an error rather than a silent 1.
pub fn parse_update_quantity(raw: &str) -> Result<i64, CartError> {
    parse_quantity(raw).ok_or_else(|| CartError::InvalidQuantity(raw.to_string()))
}

// =============================================================================
// Status Validation
// =============================================================================

/// Validates a raw fulfillment status against the enumerated set.
///
/// ## Example
/// ```rust
/// use souk_core::validation::validate_line_status;
///
/// assert!(validate_line_status("shipped").is_ok());
/// assert!(validate_line_status("teleported").is_err());
/// ```
pub fn validate_line_status(raw: &str) -> Result<LineStatus, InvalidStatus> {
    raw.trim().parse::<LineStatus>()
}

// =============================================================================
// Unit Tests
// =============================================================================
