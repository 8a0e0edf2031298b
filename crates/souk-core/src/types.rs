//! # Domain Types
//!
//! Core domain types used throughout Souk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  order_id       │       │
//! │  │  owner_id       │   │  user_id        │   │  product_id     │       │
//! │  │  price (Money)  │   │  status/is_paid │   │  quantity       │       │
//! │  │  stock          │   │  total_amount   │   │  price snapshot │       │
//! │  │  is_active      │   └─────────────────┘   │  status         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │   LineStatus    │   │   Principal     │       │
//! │  │  Pending        │   │   Pending       │   │   user_id       │       │
//! │  │  Paid           │   │   Processing    │   │   is_staff      │       │
//! │  │  Failed         │   │   Shipped       │   │   seller        │       │
//! │  └─────────────────┘   │   Delivered     │   └─────────────────┘       │
//! │                        │   Cancelled     │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order header status tracks payment; each line's status tracks
//! fulfillment independently.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidStatus;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product as seen by the checkout core.
///
/// The catalog itself (names, descriptions, categories, images) is owned by
/// an external collaborator; this is the slice the core reads. Stock is
/// mutated exclusively through the checkout transaction's locked decrement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Row id (decimal string on the cart wire format).
    pub id: i64,

    /// The seller who owns this product. Owners may never buy their own
    /// products.
    pub owner_id: i64,

    /// Display name shown in cart views and error messages.
    pub name: String,

    /// Current unit price. Snapshotted into `price_at_purchase` at checkout;
    /// later edits never rewrite committed orders.
    pub price: Money,

    /// Remaining purchasable units. Never negative.
    pub stock: i64,

    /// Whether the product is currently sellable (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether the product can currently be offered for sale.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.is_active
    }

    /// Checks whether any units remain.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Checks whether `quantity` units can be supplied from live stock.
    pub fn can_supply(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Payment status of the order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created inside the checkout transaction, not yet paid.
    Pending,
    /// Payment succeeded (stubbed: set in the same transaction).
    Paid,
    /// Payment failed.
    Failed,
}

impl OrderStatus {
    /// Lowercase database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Line Status
// =============================================================================

/// Fulfillment status of a single order line.
///
/// Mutable after checkout (by staff or the owning seller), independent of
/// the header's payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl LineStatus {
    /// Every accepted status, in lifecycle order.
    pub const ALL: [LineStatus; 5] = [
        LineStatus::Pending,
        LineStatus::Processing,
        LineStatus::Shipped,
        LineStatus::Delivered,
        LineStatus::Cancelled,
    ];

    /// Lowercase database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStatus::Pending => "pending",
            LineStatus::Processing => "processing",
            LineStatus::Shipped => "shipped",
            LineStatus::Delivered => "delivered",
            LineStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LineStatus::Pending),
            "processing" => Ok(LineStatus::Processing),
            "shipped" => Ok(LineStatus::Shipped),
            "delivered" => Ok(LineStatus::Delivered),
            "cancelled" => Ok(LineStatus::Cancelled),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

impl Default for LineStatus {
    fn default() -> Self {
        LineStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A committed purchase.
///
/// `total_amount` is authoritative: it is computed once inside the checkout
/// transaction as the sum of rounded line totals and never recomputed from
/// the lines at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Line
// =============================================================================

/// One product+quantity+price snapshot within an order.
///
/// `quantity` and `price_at_purchase` are frozen at checkout; only `status`
/// mutates afterwards. The price snapshot is what keeps historical totals
/// correct regardless of later catalog price edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub status: LineStatus,
}

impl OrderLine {
    /// Line total with currency precision: `round(price_at_purchase × qty)`.
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.line_total(self.quantity)
    }
}

// =============================================================================
// Principal
// =============================================================================

/// The acting user, pre-resolved by the external user/role directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    /// Staff/admin flag: full read and fulfillment rights.
    pub is_staff: bool,
    /// Seller role membership.
    pub seller: bool,
}

impl Principal {
    /// A plain customer with no roles.
    pub fn customer(user_id: i64) -> Self {
        Principal {
            user_id,
            is_staff: false,
            seller: false,
        }
    }

    /// A seller principal.
    pub fn seller(user_id: i64) -> Self {
        Principal {
            user_id,
            is_staff: false,
            seller: true,
        }
    }

    /// A staff principal.
    pub fn staff(user_id: i64) -> Self {
        Principal {
            user_id,
            is_staff: true,
            seller: false,
        }
    }

    /// True when the principal counts as a seller for authorization
    /// purposes: staff, or a member of the seller role.
    pub fn is_seller(&self) -> bool {
        self.is_staff || self.seller
    }

    /// True when the principal owns the given product.
    pub fn owns(&self, product: &Product) -> bool {
        product.owner_id == self.user_id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_status_round_trip() {
        for status in LineStatus::ALL {
            assert_eq!(status.as_str().parse::<LineStatus>().unwrap(), status);
        }
        assert!("teleported".parse::<LineStatus>().is_err());
    }

    #[test]
    fn test_order_status_round_trip() {
        for status in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Failed] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_can_supply() {
        let product = Product {
            id: 1,
            owner_id: 9,
            name: "Lamp".to_string(),
            price: "19.99".parse().unwrap(),
            stock: 5,
            is_active: true,
            created_at: Utc::now(),
        };

        assert!(product.can_supply(5));
        assert!(!product.can_supply(6));
        assert!(!product.can_supply(0));
    }

    #[test]
    fn test_seller_predicate() {
        assert!(Principal::staff(1).is_seller());
        assert!(Principal::seller(2).is_seller());
        assert!(!Principal::customer(3).is_seller());
    }

    #[test]
    fn test_line_total_uses_snapshot_price() {
        let line = OrderLine {
            id: 1,
            order_id: 1,
            product_id: 1,
            quantity: 2,
            price_at_purchase: "9.995".parse().unwrap(),
            status: LineStatus::Pending,
        };
        assert_eq!(line.line_total().to_string(), "19.99");
    }
}
