//! # Cart Operations
//!
//! The `cart.*` operation surface: add, update, increment, decrement,
//! remove, view.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cart Operation Flow                                 │
//! │                                                                         │
//! │  caller                                                                 │
//! │    │ cart_add(session, principal, product_id, qty)                      │
//! │    ▼                                                                    │
//! │  1. Observe expiry (stale cart → cleared, CartExpired once)             │
//! │  2. Fetch the sellable product (absent/inactive → NotFound)             │
//! │  3. Mutate the session cart under its lock (souk-core rules)            │
//! │  4. Recompute cart totals from live prices                              │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  CartMutation { quantity, lineTotal, cartTotal, cartCount, warning }    │
//! │                                                                         │
//! │  cart_view additionally runs the sanitation pass and reports what       │
//! │  it dropped/clamped as ONE aggregated notice.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock reads here are display-grade: the checkout transaction re-checks
//! everything under its own lock.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use souk_core::validation::quantity_to_add;
use souk_core::{CartError, CartUpdate, Money, Principal, Product};

use crate::error::{StorefrontError, StorefrontResult};
use crate::Storefront;

// =============================================================================
// Response DTOs
// =============================================================================

/// One line of a cart view, priced from the live catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// `round_currency(unit_price × quantity)`.
    pub line_total: Money,
}

/// The cleaned cart, plus what the sanitation pass changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    /// Sum of the rounded line totals.
    pub total: Money,
    /// Total units across lines (the cart badge).
    pub total_units: i64,
    /// True when this read observed the 24h TTL and cleared the cart.
    pub expired: bool,
    /// Product ids dropped by sanitation (gone, unsellable, self-owned,
    /// out of stock).
    pub dropped: Vec<i64>,
    /// `(product_id, new_quantity)` lines clamped down to live stock.
    pub clamped: Vec<(i64, i64)>,
}

/// Result of a single cart mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    pub product_id: i64,
    /// New line quantity; `None` when the line was removed.
    pub quantity: Option<i64>,
    pub removed: bool,
    /// Rounded line total at the live price, when the line survives.
    pub line_total: Option<Money>,
    pub cart_total: Money,
    pub cart_count: i64,
    /// A non-fatal notice (e.g. the quantity was clamped to stock).
    pub warning: Option<String>,
}

// =============================================================================
// Operations
// =============================================================================

impl Storefront {
    /// `cart.add`: puts `quantity` more units of a product in the cart.
    ///
    /// Missing or non-positive quantities are coerced to 1 (the documented
    /// add policy). Fails with `NotFound` for absent/unsellable products,
    /// `SoldOut`, `InsufficientStock` or `SelfPurchase` per cart rules.
    pub async fn cart_add(
        &self,
        session_id: &str,
        principal: &Principal,
        product_id: i64,
        quantity: Option<i64>,
    ) -> StorefrontResult<CartMutation> {
        debug!(session_id, product_id, ?quantity, "cart.add");
        self.observe_expiry(session_id)?;

        let product = self.fetch_sellable(product_id).await?;
        let qty = quantity_to_add(quantity);

        let new_qty = self
            .sessions()
            .with_cart_mut(session_id, |c| c.add(&product, principal.user_id, qty))?;

        self.mutation(session_id, product_id, Some(new_qty), Some(&product), None)
            .await
    }

    /// `cart.update`: sets a line to an explicit quantity.
    ///
    /// `quantity ≤ 0` removes the line (idempotent, no catalog lookup
    /// needed). A quantity above live stock clamps and carries a warning
    /// instead of failing.
    pub async fn cart_update(
        &self,
        session_id: &str,
        principal: &Principal,
        product_id: i64,
        quantity: i64,
    ) -> StorefrontResult<CartMutation> {
        debug!(session_id, product_id, quantity, "cart.update");
        self.observe_expiry(session_id)?;

        if quantity <= 0 {
            self.sessions()
                .with_cart_mut(session_id, |c| c.remove(product_id));
            return self.mutation(session_id, product_id, None, None, None).await;
        }

        let product = self.fetch_sellable(product_id).await?;

        let outcome = self.sessions().with_cart_mut(session_id, |c| {
            c.update(&product, principal.user_id, quantity)
        })?;

        match outcome {
            CartUpdate::Set { quantity } => {
                self.mutation(session_id, product_id, Some(quantity), Some(&product), None)
                    .await
            }
            CartUpdate::Clamped { quantity } => {
                let warning = format!("only {} of {} left in stock", quantity, product.name);
                self.mutation(
                    session_id,
                    product_id,
                    Some(quantity),
                    Some(&product),
                    Some(warning),
                )
                .await
            }
            CartUpdate::Removed => {
                // Reachable only by clamping against zero stock.
                let warning = format!("{} is sold out", product.name);
                self.mutation(session_id, product_id, None, None, Some(warning))
                    .await
            }
        }
    }

    /// `cart.increment`: adjusts a line up by exactly 1.
    pub async fn cart_increment(
        &self,
        session_id: &str,
        principal: &Principal,
        product_id: i64,
    ) -> StorefrontResult<CartMutation> {
        debug!(session_id, product_id, "cart.increment");
        self.observe_expiry(session_id)?;

        let product = self.fetch_sellable(product_id).await?;

        let new_qty = self
            .sessions()
            .with_cart_mut(session_id, |c| c.increment(&product, principal.user_id))?;

        self.mutation(session_id, product_id, Some(new_qty), Some(&product), None)
            .await
    }

    /// `cart.decrement`: adjusts a line down by exactly 1; reaching 0
    /// removes it.
    pub async fn cart_decrement(
        &self,
        session_id: &str,
        product_id: i64,
    ) -> StorefrontResult<CartMutation> {
        debug!(session_id, product_id, "cart.decrement");
        self.observe_expiry(session_id)?;

        let outcome = self
            .sessions()
            .with_cart_mut(session_id, |c| c.decrement(product_id))?;

        // Only needed to price the response line; a vanished product just
        // leaves line_total empty.
        let product = self.db().products().get_sellable(product_id).await?;

        match outcome {
            CartUpdate::Removed => self.mutation(session_id, product_id, None, None, None).await,
            CartUpdate::Set { quantity } | CartUpdate::Clamped { quantity } => {
                self.mutation(
                    session_id,
                    product_id,
                    Some(quantity),
                    product.as_ref(),
                    None,
                )
                .await
            }
        }
    }

    /// `cart.remove`: unconditionally removes a line.
    ///
    /// Reports `NotInCart` when the line was absent so API callers can
    /// choose 404 vs 200; either way the cart ends without the line.
    pub async fn cart_remove(
        &self,
        session_id: &str,
        product_id: i64,
    ) -> StorefrontResult<CartMutation> {
        debug!(session_id, product_id, "cart.remove");
        self.observe_expiry(session_id)?;

        let was_present = self
            .sessions()
            .with_cart_mut(session_id, |c| c.remove(product_id));

        if !was_present {
            return Err(CartError::NotInCart(product_id).into());
        }

        self.mutation(session_id, product_id, None, None, None).await
    }

    /// `cart.view`: the cleaned cart with live prices and totals.
    ///
    /// Runs the sanitation pass first; whatever it dropped or clamped is
    /// reported on the view so the caller can show one aggregated notice.
    /// An expired cart is reported with `expired: true` (and comes back
    /// empty) rather than as an error.
    pub async fn cart_view(
        &self,
        session_id: &str,
        principal: &Principal,
    ) -> StorefrontResult<CartView> {
        debug!(session_id, "cart.view");
        let expired = self.sessions().expire_if_stale(session_id, Utc::now());

        let ids = self.sessions().with_cart(session_id, |c| c.product_ids());
        let products = self.db().products().get_sellable_many(&ids).await?;

        let sanitation = self
            .sessions()
            .with_cart_mut(session_id, |c| c.sanitize(&products, principal.user_id));

        let raw_lines: Vec<(i64, i64)> = self
            .sessions()
            .with_cart(session_id, |c| c.lines().collect());

        let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let mut lines = Vec::with_capacity(raw_lines.len());
        let mut total = Money::zero();
        let mut total_units = 0;

        for (product_id, quantity) in raw_lines {
            // Sanitation just dropped anything absent from the snapshot.
            if let Some(product) = by_id.get(&product_id) {
                let line_total = product.price.line_total(quantity);
                total += line_total;
                total_units += quantity;
                lines.push(CartLineView {
                    product_id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                    line_total,
                });
            }
        }

        Ok(CartView {
            lines,
            total,
            total_units,
            expired,
            dropped: sanitation.dropped,
            clamped: sanitation.clamped,
        })
    }

    // -------------------------------------------------------------------------
    // Shared Helpers
    // -------------------------------------------------------------------------

    /// Observes expiry before a mutation; an expired cart has already been
    /// cleared by the time the error is returned.
    pub(crate) fn observe_expiry(&self, session_id: &str) -> StorefrontResult<()> {
        if self.sessions().expire_if_stale(session_id, Utc::now()) {
            Err(StorefrontError::CartExpired)
        } else {
            Ok(())
        }
    }

    /// Sellable-product lookup; an inactive product is indistinguishable
    /// from an absent one.
    pub(crate) async fn fetch_sellable(&self, product_id: i64) -> StorefrontResult<Product> {
        self.db()
            .products()
            .get_sellable(product_id)
            .await?
            .ok_or(StorefrontError::NotFound {
                entity: "Product",
                id: product_id,
            })
    }

    /// Builds a mutation response with fresh cart totals.
    async fn mutation(
        &self,
        session_id: &str,
        product_id: i64,
        quantity: Option<i64>,
        product: Option<&Product>,
        warning: Option<String>,
    ) -> StorefrontResult<CartMutation> {
        let (cart_total, cart_count) = self.cart_totals(session_id).await?;

        Ok(CartMutation {
            product_id,
            quantity,
            removed: quantity.is_none(),
            line_total: match (product, quantity) {
                (Some(p), Some(qty)) => Some(p.price.line_total(qty)),
                _ => None,
            },
            cart_total,
            cart_count,
            warning,
        })
    }

    /// Totals over lines that still resolve in the catalog: sum of rounded
    /// line totals, and the unit count.
    async fn cart_totals(&self, session_id: &str) -> StorefrontResult<(Money, i64)> {
        let lines: Vec<(i64, i64)> = self
            .sessions()
            .with_cart(session_id, |c| c.lines().collect());

        let ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
        let products = self.db().products().get_sellable_many(&ids).await?;
        let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let mut total = Money::zero();
        let mut count = 0;
        for (product_id, quantity) in lines {
            if let Some(product) = by_id.get(&product_id) {
                total += product.price.line_total(quantity);
            }
            count += quantity;
        }

        Ok((total, count))
    }
}
