//! # souk-db: Database Layer for Souk
//!
//! This crate provides database access for the Souk checkout system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Souk Data Flow                                  │
//! │                                                                         │
//! │  Storefront operation (cart.view, checkout.submit, …)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     souk-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_init.sql │  │   │
//! │  │   │ WAL + busy    │    │ CheckoutRepo  │    │ ...          │  │   │
//! │  │   │ timeout       │    │ (BEGIN        │    │              │  │   │
//! │  │   └───────────────┘    │  IMMEDIATE)   │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types (including the retryable `Busy`)
//! - [`repository`] - Repository implementations (product, order, checkout)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use souk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/souk.db")).await?;
//!
//! let products = db.products().get_sellable_many(&[1, 2, 3]).await?;
//! let outcome = db.checkout().commit(buyer_id, &[(1, 2)]).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::checkout::{CheckoutOutcome, CheckoutRepository, CommittedOrder};
pub use repository::order::OrderRepository;
pub use repository::product::{NewProduct, ProductRepository};
