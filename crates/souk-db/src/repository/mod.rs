//! # Repository Module
//!
//! Database repository implementations for Souk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Responsibilities                          │
//! │                                                                         │
//! │  ProductRepository   Catalog reads (sellable-filtered) + inserts.       │
//! │                      NEVER writes stock.                                │
//! │                                                                         │
//! │  OrderRepository     Order/line read side, per-user listings,           │
//! │                      line fulfillment status updates.                   │
//! │                                                                         │
//! │  CheckoutRepository  The one transaction that creates orders and        │
//! │                      decrements stock, all-or-nothing, under the        │
//! │                      up-front write lock.                               │
//! │                                                                         │
//! │  SQL is isolated here; business rules stay in souk-core.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod order;
pub mod product;
