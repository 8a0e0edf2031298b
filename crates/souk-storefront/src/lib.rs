//! # souk-storefront: Operation Surface for Souk
//!
//! The orchestration layer tying session carts to the database: every
//! logical operation a caller can perform, with authorization, expiry
//! observation and error mapping. HTTP/CLI framing stays outside this
//! crate; embed [`Storefront`] and call the operations directly.
//!
//! ## Operation Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Operations                               │
//! │                                                                         │
//! │  cart.add         cart.update      cart.increment    cart.decrement    │
//! │  cart.remove      cart.view                                             │
//! │                                                                         │
//! │  checkout.submit  ── the atomic cart → order conversion                 │
//! │                                                                         │
//! │  order.view       order.list       order.line.update_status            │
//! │                                                                         │
//! │  Sessions: create / destroy / export / import (wire format)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use souk_db::{Database, DbConfig};
//! use souk_storefront::Storefront;
//! use souk_core::Principal;
//!
//! let db = Database::new(DbConfig::new("./souk.db")).await?;
//! let shop = Storefront::new(db);
//!
//! let session = shop.sessions().create();
//! let buyer = Principal::customer(7);
//!
//! shop.cart_add(&session, &buyer, product_id, Some(2)).await?;
//! let receipt = shop.checkout_submit(&session, &buyer).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod orders;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{CartLineView, CartMutation, CartView};
pub use checkout::CheckoutReceipt;
pub use error::{ErrorCode, StorefrontError, StorefrontResult};
pub use orders::OrderDetail;
pub use session::SessionStore;

use souk_db::Database;

// =============================================================================
// Storefront
// =============================================================================

/// The storefront service: a database handle plus the in-process session
/// cart store.
///
/// Cheap to clone; clones share the same session store and pool.
#[derive(Debug, Clone)]
pub struct Storefront {
    db: Database,
    sessions: SessionStore,
}

impl Storefront {
    /// Creates a storefront over an initialized database.
    pub fn new(db: Database) -> Self {
        Storefront {
            db,
            sessions: SessionStore::new(),
        }
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The session cart store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
