//! # souk-core: Pure Business Logic for Souk
//!
//! This crate is the **heart** of the Souk checkout system. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Souk Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  souk-storefront (operations)                   │   │
//! │  │   cart.add ─► cart.view ─► checkout.submit ─► order.view        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ souk-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │   Order   │  │ rounding  │  │ sanitize  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK AMBIENT STATE                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    souk-db (Database Layer)                     │   │
//! │  │        SQLite repositories + the checkout transaction           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderLine, Principal)
//! - [`money`] - Fixed-point money with round-half-up currency rounding
//! - [`cart`] - The session cart value object and its mutation rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input normalization (quantity policy, status values)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: operations take what they need and return results
//! 2. **No I/O**: database, network and session storage are FORBIDDEN here
//! 3. **Decimal Money**: fixed-point decimals, rounded half-up per line
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use souk_core::Money` instead of
// `use souk_core::money::Money`

pub use cart::{Cart, CartUpdate, Sanitation};
pub use error::{CartError, InvalidStatus, MoneyError, Violation};
pub use money::Money;
pub use types::{LineStatus, Order, OrderLine, OrderStatus, Principal, Product};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency precision: 2 fractional digits.
///
/// Every persisted monetary value passes through
/// [`Money::round_currency`] at this scale before being summed or stored.
pub const CURRENCY_SCALE: u32 = 2;

/// Session cart time-to-live, in hours.
///
/// A cart whose `created_at` is older than this is expired; expiry is
/// observed on the next touch (see [`Cart::expire_if_stale`]), never swept
/// proactively.
pub const CART_TTL_HOURS: i64 = 24;
