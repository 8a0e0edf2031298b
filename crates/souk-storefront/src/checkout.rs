//! # Checkout Operation
//!
//! `checkout.submit`: the Building stage of the checkout state machine,
//! in front of the database transaction.
//!
//! ## State Machine (storefront + souk-db)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Building (here)                                                        │
//! │  ├── observe expiry          stale → CartExpired, cart cleared          │
//! │  ├── sanitize cart           self-healing drops/clamps                  │
//! │  └── empty after cleaning?   → EmptyCart, nothing touched               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Validating + Committing (souk-db, one BEGIN IMMEDIATE transaction)     │
//! │        │                                                                │
//! │        ├── Committed ──► clear the session cart, return the receipt     │
//! │        ├── Rejected  ──► Aborted(all violations), cart left untouched   │
//! │        ├── Busy      ──► Busy (retry by resubmitting)                   │
//! │        └── fault     ──► logged with context, generic CheckoutFailed    │
//! │                                                                         │
//! │  Nothing is retried automatically; the user must resubmit.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use souk_core::{Order, OrderLine, Principal};
use souk_db::CheckoutOutcome;

use crate::error::{StorefrontError, StorefrontResult};
use crate::Storefront;

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    /// Lines the pre-checkout sanitation dropped (surfaced as one notice
    /// alongside the receipt).
    pub dropped: Vec<i64>,
    /// Lines sanitation clamped to live stock before the attempt.
    pub clamped: Vec<(i64, i64)>,
}

impl Storefront {
    /// `checkout.submit`: converts the session cart into a durable order.
    ///
    /// All-or-nothing: on any validation violation or fault the database
    /// is untouched and the cart keeps its contents; only a committed
    /// checkout clears the cart.
    pub async fn checkout_submit(
        &self,
        session_id: &str,
        principal: &Principal,
    ) -> StorefrontResult<CheckoutReceipt> {
        debug!(session_id, user_id = principal.user_id, "checkout.submit");

        if self.sessions().expire_if_stale(session_id, Utc::now()) {
            return Err(StorefrontError::CartExpired);
        }

        // Building: sanitize against a live catalog snapshot. The
        // transaction re-validates under its lock; this pass just keeps
        // honest carts from aborting over lines the user cannot see.
        let ids = self.sessions().with_cart(session_id, |c| c.product_ids());
        let products = self.db().products().get_sellable_many(&ids).await?;

        let (sanitation, lines) = self.sessions().with_cart_mut(session_id, |c| {
            let sanitation = c.sanitize(&products, principal.user_id);
            let lines: Vec<(i64, i64)> = c.lines().collect();
            (sanitation, lines)
        });

        if lines.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        match self.db().checkout().commit(principal.user_id, &lines).await {
            Ok(CheckoutOutcome::Committed(committed)) => {
                self.sessions().with_cart_mut(session_id, |c| c.clear());
                info!(
                    order_id = committed.order.id,
                    user_id = principal.user_id,
                    total = %committed.order.total_amount,
                    "checkout.submit committed"
                );
                Ok(CheckoutReceipt {
                    order: committed.order,
                    lines: committed.lines,
                    dropped: sanitation.dropped,
                    clamped: sanitation.clamped,
                })
            }
            Ok(CheckoutOutcome::Rejected(violations)) => {
                info!(
                    user_id = principal.user_id,
                    violation_count = violations.len(),
                    "checkout.submit aborted, cart left untouched"
                );
                Err(StorefrontError::Aborted { violations })
            }
            Err(err) if err.is_busy() => Err(StorefrontError::Busy),
            Err(err) => {
                error!(
                    error = %err,
                    session_id,
                    user_id = principal.user_id,
                    "checkout.submit failed unexpectedly; transaction rolled back"
                );
                Err(StorefrontError::CheckoutFailed)
            }
        }
    }
}
