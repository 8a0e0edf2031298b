//! # Checkout Repository
//!
//! The transaction that turns a cleaned cart into a durable order.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Checkout Transaction (all inside BEGIN IMMEDIATE)          │
//! │                                                                         │
//! │  BEGIN IMMEDIATE ── acquires the write lock up front, in one step.     │
//! │       │             A competing checkout waits here (≤ busy_timeout),   │
//! │       │             then either proceeds on fresh data or gets Busy.    │
//! │       ▼                                                                 │
//! │  Batch read of every referenced product (one query)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Validate EVERY line: exists? sellable? not self-owned?                 │
//! │  quantity ≤ locked stock?  → collect ALL violations                     │
//! │       │                                                                 │
//! │       ├── any violation ──► ROLLBACK, return Rejected(violations)       │
//! │       │                     (no writes, cart untouched)                 │
//! │       ▼                                                                 │
//! │  INSERT order (pending, total 0)                                        │
//! │  per line: INSERT order_items (price snapshot),                         │
//! │            accumulate round(price × qty),                               │
//! │            UPDATE stock = stock − qty WHERE stock ≥ qty (guarded)       │
//! │  UPDATE order: total_amount, status = paid, is_paid = 1                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ── decrements and the order become visible atomically           │
//! │                                                                         │
//! │  Any fault after validation → ROLLBACK (Transaction drop), the          │
//! │  caller reports a generic failure. Never a partial order.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BEGIN IMMEDIATE` is the SQLite shape of "row locks on the exact set,
//! acquired in a single batch": the engine has one writer, so taking the
//! write lock at BEGIN covers every referenced row for the transaction's
//! lifetime and cannot deadlock on lock ordering. The guarded UPDATE is
//! kept as the compare-and-swap form, so stock can never go negative even
//! if the locking discipline were ever weakened.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{Connection, Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::row_to_product;
use souk_core::{LineStatus, Money, Order, OrderLine, OrderStatus, Product, Violation};

// =============================================================================
// Outcome Types
// =============================================================================

/// A successfully committed checkout.
#[derive(Debug, Clone)]
pub struct CommittedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Result of a checkout attempt that reached the database.
///
/// `Rejected` is a *clean* outcome: the transaction validated the cart,
/// found violations, wrote nothing and released its locks. Storage faults
/// are `Err(DbError)` instead.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Committed(CommittedOrder),
    Rejected(Vec<Violation>),
}

// =============================================================================
// Checkout Repository
// =============================================================================

/// The only code path that decrements stock.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    /// Creates a new CheckoutRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Runs the checkout transaction for a cleaned cart.
    ///
    /// ## Arguments
    /// * `buyer_id` - The purchasing user
    /// * `lines` - `(product_id, quantity)` pairs; quantities are positive
    ///   (the storefront sanitized the cart before calling)
    ///
    /// ## Returns
    /// * `Ok(CheckoutOutcome::Committed)` - order created, stock decremented
    /// * `Ok(CheckoutOutcome::Rejected)` - every violation found, no writes
    /// * `Err(DbError::Busy)` - a competing checkout held the lock too long
    /// * `Err(_)` - unexpected fault; the transaction rolled back
    pub async fn commit(&self, buyer_id: i64, lines: &[(i64, i64)]) -> DbResult<CheckoutOutcome> {
        if lines.is_empty() {
            return Err(DbError::Internal(
                "checkout requires at least one cart line".to_string(),
            ));
        }

        debug!(buyer_id, line_count = lines.len(), "Starting checkout transaction");

        let mut conn = self.pool.acquire().await?;

        // The write lock for the whole row set, taken in one step. A
        // deferred BEGIN would let two checkouts validate against the same
        // stale stock and fight at the first write.
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await?;

        // ---------------------------------------------------------------------
        // Validating: one batch read, then check every line
        // ---------------------------------------------------------------------

        let ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, owner_id, name, price, stock, is_active, created_at \
             FROM products WHERE id IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }

        let locked: BTreeMap<i64, Product> = query
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| row_to_product(row).map(|p| (p.id, p)))
            .collect::<DbResult<_>>()?;

        let mut violations = Vec::new();
        for (product_id, quantity) in lines {
            match locked.get(product_id) {
                None => violations.push(Violation::Unavailable {
                    product_id: *product_id,
                }),
                Some(product) if !product.is_sellable() => {
                    violations.push(Violation::Unavailable {
                        product_id: *product_id,
                    });
                }
                Some(product) if product.owner_id == buyer_id => {
                    violations.push(Violation::SelfPurchase {
                        product_id: *product_id,
                        name: product.name.clone(),
                    });
                }
                Some(product) if !product.can_supply(*quantity) => {
                    violations.push(Violation::InsufficientStock {
                        product_id: *product_id,
                        name: product.name.clone(),
                        available: product.stock,
                        requested: *quantity,
                    });
                }
                Some(_) => {}
            }
        }

        if !violations.is_empty() {
            tx.rollback().await?;
            info!(
                buyer_id,
                violation_count = violations.len(),
                "Checkout rejected, nothing written"
            );
            return Ok(CheckoutOutcome::Rejected(violations));
        }

        // ---------------------------------------------------------------------
        // Committing: order header, lines with price snapshots, decrements
        // ---------------------------------------------------------------------

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO orders (user_id, status, is_paid, total_amount, created_at)
            VALUES (?1, 'pending', 0, '0.00', ?2)
            "#,
        )
        .bind(buyer_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let order_id = result.last_insert_rowid();

        let mut total = Money::zero();
        let mut committed_lines = Vec::with_capacity(lines.len());

        for (product_id, quantity) in lines {
            // Validated with zero violations above, under the same lock.
            let product = locked
                .get(product_id)
                .ok_or_else(|| DbError::TransactionFailed(format!(
                    "validated product {product_id} vanished mid-transaction"
                )))?;

            let result = sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase, status)
                VALUES (?1, ?2, ?3, ?4, 'pending')
                "#,
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(product.price.to_string())
            .execute(&mut *tx)
            .await?;
            let line_id = result.last_insert_rowid();

            // Each line is rounded to currency precision BEFORE summation,
            // so the stored total equals the sum of displayed line totals.
            total += product.price.line_total(*quantity);

            // Guarded decrement: exactly once per committed unit, and the
            // WHERE clause refuses to take stock below zero.
            let decrement = sqlx::query(
                r#"
                UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1
                "#,
            )
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

            if decrement.rows_affected() == 0 {
                // Dropping tx rolls everything back.
                return Err(DbError::TransactionFailed(format!(
                    "stock guard refused decrement for product {product_id}"
                )));
            }

            committed_lines.push(OrderLine {
                id: line_id,
                order_id,
                product_id: *product_id,
                quantity: *quantity,
                price_at_purchase: product.price,
                status: LineStatus::Pending,
            });
        }

        // Payment is stubbed: the order is immediately marked paid.
        sqlx::query(
            r#"
            UPDATE orders SET total_amount = ?1, status = 'paid', is_paid = 1 WHERE id = ?2
            "#,
        )
        .bind(total.to_string())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id,
            buyer_id,
            total = %total,
            line_count = committed_lines.len(),
            "Checkout committed"
        );

        Ok(CheckoutOutcome::Committed(CommittedOrder {
            order: Order {
                id: order_id,
                user_id: buyer_id,
                status: OrderStatus::Paid,
                is_paid: true,
                total_amount: total,
                created_at: now,
            },
            lines: committed_lines,
        }))
    }

    /// Reads a product's live stock (test/diagnostic helper).
    pub async fn stock_of(&self, product_id: i64) -> DbResult<i64> {
        let row = sqlx::query("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        Ok(row.try_get("stock")?)
    }
}
