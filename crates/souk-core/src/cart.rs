//! # Cart Module
//!
//! The session-scoped cart value object and its mutation rules.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Lifecycle                                   │
//! │                                                                         │
//! │  first mutation ──► Cart::new()  (created_at stamped)                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add / update / increment / decrement / remove                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  sanitize() before every read-heavy operation                           │
//! │  (view, checkout) - drops dead lines, clamps over-stock lines           │
//! │        │                                                                │
//! │        ├── successful checkout ──► clear() (timestamp reset)            │
//! │        └── 24h TTL elapsed, observed on next touch ──► clear()          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! Every operation takes the product data it needs as an argument and
//! mutates only the cart value. Catalog lookups, session storage and clock
//! observation for expiry live in souk-storefront.
//!
//! ## Wire Format
//! ```json
//! { "cart": { "42": 3, "57": 1 }, "cart_created_at": "2026-08-08T12:00:00Z" }
//! ```
//! Keys are decimal-string product ids; quantities are positive integers.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::types::Product;
use crate::CART_TTL_HOURS;

// =============================================================================
// Outcome Types
// =============================================================================

/// Result of a quantity-changing cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// The line was removed (explicit removal, update to ≤ 0, or clamp
    /// against zero stock).
    Removed,
    /// The line now holds exactly the requested quantity.
    Set { quantity: i64 },
    /// The requested quantity exceeded live stock and was clamped down.
    /// Callers should surface a warning, not an error.
    Clamped { quantity: i64 },
}

/// What a sanitation pass changed, so the caller can surface one aggregated
/// notice instead of a message per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitation {
    /// Product ids whose lines were dropped entirely.
    pub dropped: Vec<i64>,
    /// `(product_id, new_quantity)` for lines clamped to live stock.
    pub clamped: Vec<(i64, i64)>,
}

impl Sanitation {
    /// True when the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.clamped.is_empty()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The session-scoped shopping cart.
///
/// ## Invariants
/// - Every stored quantity is positive; reaching 0 removes the line.
/// - Keys refer to products that existed and were sellable when written;
///   `sanitize` re-establishes this against the live catalog (self-healing,
///   not a hard failure).
/// - A cart older than [`CART_TTL_HOURS`] is expired; expiry is observed on
///   the next touch, never swept proactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// product id → quantity. BTreeMap keeps iteration (and therefore
    /// checkout line order and sanitation reports) deterministic.
    #[serde(rename = "cart")]
    items: BTreeMap<i64, i64>,

    /// When the cart was created or last cleared.
    #[serde(rename = "cart_created_at")]
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart, stamped now.
    pub fn new() -> Self {
        Cart {
            items: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// When the cart was created or last cleared.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks if the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines (the "cart count" badge).
    pub fn total_units(&self) -> i64 {
        self.items.values().sum()
    }

    /// Quantity of a product, if present.
    pub fn quantity(&self, product_id: i64) -> Option<i64> {
        self.items.get(&product_id).copied()
    }

    /// Iterates `(product_id, quantity)` in ascending product id order.
    pub fn lines(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.items.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Product ids currently in the cart, ascending.
    pub fn product_ids(&self) -> Vec<i64> {
        self.items.keys().copied().collect()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Adds `requested` units of a product, accumulating onto any existing
    /// line.
    ///
    /// ## Quantity Policy
    /// Non-positive requests are coerced to 1. This is the single documented
    /// policy for `add` (the wire-level "missing or non-numeric defaults to
    /// 1" lives in [`crate::validation::quantity_to_add`]); `update` keeps
    /// its distinct explicit-set semantics where ≤ 0 removes.
    ///
    /// ## Errors
    /// - [`CartError::SelfPurchase`] when the buyer owns the product
    /// - [`CartError::SoldOut`] when live stock is 0
    /// - [`CartError::InsufficientStock`] when the new line total would
    ///   exceed live stock
    pub fn add(&mut self, product: &Product, buyer_id: i64, requested: i64) -> Result<i64, CartError> {
        let requested = requested.max(1);

        if product.owner_id == buyer_id {
            return Err(CartError::SelfPurchase {
                name: product.name.clone(),
            });
        }

        if product.stock <= 0 {
            return Err(CartError::SoldOut {
                name: product.name.clone(),
            });
        }

        let current = self.quantity(product.id).unwrap_or(0);
        let new_qty = current + requested;

        if new_qty > product.stock {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: new_qty,
            });
        }

        self.items.insert(product.id, new_qty);
        Ok(new_qty)
    }

    /// Sets a line to an explicit quantity.
    ///
    /// ## Behavior
    /// - `quantity ≤ 0` removes the line; removing an absent line is a
    ///   no-op success (idempotent).
    /// - `quantity > live stock` clamps to live stock and reports
    ///   [`CartUpdate::Clamped`] (a warning, not a failure). Clamping
    ///   against zero stock removes the line.
    pub fn update(
        &mut self,
        product: &Product,
        buyer_id: i64,
        quantity: i64,
    ) -> Result<CartUpdate, CartError> {
        if quantity <= 0 {
            self.items.remove(&product.id);
            return Ok(CartUpdate::Removed);
        }

        if product.owner_id == buyer_id {
            return Err(CartError::SelfPurchase {
                name: product.name.clone(),
            });
        }

        if quantity > product.stock {
            if product.stock <= 0 {
                self.items.remove(&product.id);
                return Ok(CartUpdate::Removed);
            }
            self.items.insert(product.id, product.stock);
            return Ok(CartUpdate::Clamped {
                quantity: product.stock,
            });
        }

        self.items.insert(product.id, quantity);
        Ok(CartUpdate::Set { quantity })
    }

    /// Increases an existing line by exactly 1.
    ///
    /// ## Errors
    /// - [`CartError::NotInCart`] when the product has no line
    /// - [`CartError::InsufficientStock`] when already at live stock
    pub fn increment(&mut self, product: &Product, buyer_id: i64) -> Result<i64, CartError> {
        let current = self
            .quantity(product.id)
            .ok_or(CartError::NotInCart(product.id))?;

        if product.owner_id == buyer_id {
            return Err(CartError::SelfPurchase {
                name: product.name.clone(),
            });
        }

        let new_qty = current + 1;
        if new_qty > product.stock {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: new_qty,
            });
        }

        self.items.insert(product.id, new_qty);
        Ok(new_qty)
    }

    /// Decreases an existing line by exactly 1; reaching 0 removes it.
    ///
    /// Needs no product snapshot: moving down never violates stock.
    ///
    /// ## Errors
    /// - [`CartError::NotInCart`] when the product has no line
    pub fn decrement(&mut self, product_id: i64) -> Result<CartUpdate, CartError> {
        let current = self
            .quantity(product_id)
            .ok_or(CartError::NotInCart(product_id))?;

        let new_qty = current - 1;
        if new_qty <= 0 {
            self.items.remove(&product_id);
            Ok(CartUpdate::Removed)
        } else {
            self.items.insert(product_id, new_qty);
            Ok(CartUpdate::Set { quantity: new_qty })
        }
    }

    /// Removes a line unconditionally.
    ///
    /// Returns whether the line existed, so API callers can pick 404 vs 200;
    /// either way the cart ends up without the line.
    pub fn remove(&mut self, product_id: i64) -> bool {
        self.items.remove(&product_id).is_some()
    }

    /// Clears all lines and resets the creation timestamp.
    ///
    /// Called on successful checkout and on observed expiry.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Sanitation
    // -------------------------------------------------------------------------

    /// Re-validates every line against a live catalog snapshot.
    ///
    /// Run before every read-heavy operation (viewing the cart, starting
    /// checkout). Per line:
    /// - drop it if the product is missing or no longer sellable
    /// - drop it if the buyer owns the product
    /// - drop it if the quantity is ≤ 0 or live stock is exactly 0
    /// - clamp it to live stock if the quantity exceeds live stock
    ///
    /// Idempotent: a second pass over the same snapshot changes nothing.
    pub fn sanitize(&mut self, products: &[Product], buyer_id: i64) -> Sanitation {
        let by_id: BTreeMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let mut report = Sanitation::default();

        let lines: Vec<(i64, i64)> = self.lines().collect();
        for (product_id, qty) in lines {
            let product = match by_id.get(&product_id) {
                Some(p) if p.is_sellable() => *p,
                _ => {
                    self.items.remove(&product_id);
                    report.dropped.push(product_id);
                    continue;
                }
            };

            if product.owner_id == buyer_id || qty <= 0 || product.stock <= 0 {
                self.items.remove(&product_id);
                report.dropped.push(product_id);
                continue;
            }

            if qty > product.stock {
                self.items.insert(product_id, product.stock);
                report.clamped.push((product_id, product.stock));
            }
        }

        report
    }

    // -------------------------------------------------------------------------
    // Expiry
    // -------------------------------------------------------------------------

    /// Checks whether the cart has outlived its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::hours(CART_TTL_HOURS)
    }

    /// Observes expiry: if stale at `now`, clears the cart and resets the
    /// timestamp, returning `true` so the caller can surface `CartExpired`
    /// exactly once. Abandoned carts are reclaimed only when touched.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            self.items.clear();
            self.created_at = now;
            true
        } else {
            false
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: i64, stock: i64) -> Product {
        Product {
            id,
            owner_id: 900,
            name: format!("Product {}", id),
            price: "10.00".parse().unwrap(),
            stock,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    const BUYER: i64 = 1;

    #[test]
    fn test_add_accumulates() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        assert_eq!(cart.add(&p, BUYER, 2).unwrap(), 2);
        assert_eq!(cart.add(&p, BUYER, 3).unwrap(), 5);
        assert_eq!(cart.quantity(7), Some(5));
        assert_eq!(cart.total_units(), 5);
    }

    #[test]
    fn test_add_coerces_non_positive_to_one() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        assert_eq!(cart.add(&p, BUYER, 0).unwrap(), 1);
        assert_eq!(cart.add(&p, BUYER, -4).unwrap(), 2);
    }

    #[test]
    fn test_add_sold_out() {
        let mut cart = Cart::new();
        let p = test_product(7, 0);

        assert!(matches!(
            cart.add(&p, BUYER, 1),
            Err(CartError::SoldOut { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_insufficient_stock() {
        let mut cart = Cart::new();
        let p = test_product(7, 3);

        cart.add(&p, BUYER, 2).unwrap();
        let err = cart.add(&p, BUYER, 2).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                name: "Product 7".to_string(),
                available: 3,
                requested: 4,
            }
        );
        // The failed add leaves the line untouched.
        assert_eq!(cart.quantity(7), Some(2));
    }

    #[test]
    fn test_add_rejects_self_purchase() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        assert!(matches!(
            cart.add(&p, p.owner_id, 1),
            Err(CartError::SelfPurchase { .. })
        ));
    }

    #[test]
    fn test_update_zero_removes_idempotently() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        cart.add(&p, BUYER, 2).unwrap();
        assert_eq!(cart.update(&p, BUYER, 0).unwrap(), CartUpdate::Removed);
        // Removing the absent line again is still a success.
        assert_eq!(cart.update(&p, BUYER, -1).unwrap(), CartUpdate::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_clamps_to_stock_with_warning() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        cart.add(&p, BUYER, 2).unwrap();
        assert_eq!(
            cart.update(&p, BUYER, 20).unwrap(),
            CartUpdate::Clamped { quantity: 10 }
        );
        assert_eq!(cart.quantity(7), Some(10));
    }

    #[test]
    fn test_update_against_zero_stock_removes() {
        let mut cart = Cart::new();
        let mut p = test_product(7, 10);

        cart.add(&p, BUYER, 2).unwrap();
        p.stock = 0;
        assert_eq!(cart.update(&p, BUYER, 5).unwrap(), CartUpdate::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut cart = Cart::new();
        let p = test_product(7, 2);

        assert!(matches!(
            cart.increment(&p, BUYER),
            Err(CartError::NotInCart(7))
        ));

        cart.add(&p, BUYER, 1).unwrap();
        assert_eq!(cart.increment(&p, BUYER).unwrap(), 2);
        assert!(matches!(
            cart.increment(&p, BUYER),
            Err(CartError::InsufficientStock { .. })
        ));

        assert_eq!(
            cart.decrement(7).unwrap(),
            CartUpdate::Set { quantity: 1 }
        );
        assert_eq!(cart.decrement(7).unwrap(), CartUpdate::Removed);
        assert!(matches!(cart.decrement(7), Err(CartError::NotInCart(7))));
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);

        cart.add(&p, BUYER, 1).unwrap();
        assert!(cart.remove(7));
        assert!(!cart.remove(7));
    }

    #[test]
    fn test_sanitize_drops_and_clamps() {
        let mut cart = Cart::new();
        let kept = test_product(1, 10);
        let over = test_product(2, 3);
        let sold_out = test_product(3, 10);
        let inactive = {
            let mut p = test_product(4, 10);
            p.is_active = false;
            p
        };
        let own = {
            let mut p = test_product(5, 10);
            p.owner_id = BUYER;
            p
        };

        cart.add(&kept, BUYER, 2).unwrap();
        cart.add(&over, BUYER, 3).unwrap();
        cart.add(&sold_out, BUYER, 1).unwrap();
        cart.add(&inactive, BUYER, 1).unwrap();
        // Line 5 sneaks in as if ownership changed after the add.
        cart.add(&test_product(5, 10), BUYER, 1).unwrap();
        // Line 6 references a product that disappeared from the catalog.
        cart.add(&test_product(6, 10), BUYER, 1).unwrap();

        let mut over_after = over.clone();
        over_after.stock = 2;
        let mut sold_out_after = sold_out.clone();
        sold_out_after.stock = 0;

        let catalog = vec![
            kept.clone(),
            over_after.clone(),
            sold_out_after,
            inactive,
            own,
        ];

        let report = cart.sanitize(&catalog, BUYER);

        assert_eq!(report.dropped, vec![3, 4, 5, 6]);
        assert_eq!(report.clamped, vec![(2, 2)]);
        assert_eq!(cart.quantity(1), Some(2));
        assert_eq!(cart.quantity(2), Some(2));
        assert_eq!(cart.len(), 2);

        // Idempotence: a second pass over the same snapshot is clean.
        let again = cart.sanitize(&catalog, BUYER);
        assert!(again.is_clean());
        assert_eq!(cart.quantity(1), Some(2));
        assert_eq!(cart.quantity(2), Some(2));
    }

    #[test]
    fn test_expiry_observed_on_touch() {
        let mut cart = Cart::new();
        let p = test_product(7, 10);
        cart.add(&p, BUYER, 2).unwrap();

        let now = cart.created_at();
        assert!(!cart.is_expired(now + Duration::hours(23)));
        assert!(!cart.expire_if_stale(now + Duration::hours(23)));
        assert_eq!(cart.quantity(7), Some(2));

        let later = now + Duration::hours(25);
        assert!(cart.is_expired(later));
        assert!(cart.expire_if_stale(later));
        assert!(cart.is_empty());
        assert_eq!(cart.created_at(), later);

        // The reset timestamp means the next touch is NOT expired again.
        assert!(!cart.expire_if_stale(later));
    }

    #[test]
    fn test_wire_format() {
        let mut cart = Cart::new();
        let p = test_product(42, 10);
        cart.add(&p, BUYER, 3).unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value["cart"]["42"], 3);
        assert!(value["cart_created_at"].is_string());

        let back: Cart = serde_json::from_value(value).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_wire_format_string_keys_parse() {
        let json = r#"{"cart":{"12":2,"7":1},"cart_created_at":"2026-08-08T12:00:00Z"}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.quantity(12), Some(2));
        assert_eq!(cart.quantity(7), Some(1));
        assert_eq!(cart.product_ids(), vec![7, 12]);
    }
}
