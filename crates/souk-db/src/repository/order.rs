//! # Order Repository
//!
//! Read side of the order aggregate, plus the single permitted
//! post-creation mutation: per-line fulfillment status.
//!
//! ## Immutability
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Orders and their lines are written ONCE, inside the checkout           │
//! │  transaction (repository/checkout.rs). This repository:                 │
//! │                                                                         │
//! │    reads:   order header, lines, per-user listings                      │
//! │    writes:  order_items.status, nothing else, ever                      │
//! │                                                                         │
//! │  quantity, price_at_purchase and total_amount never change here.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use souk_core::{LineStatus, Money, Order, OrderLine, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order header by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, status, is_paid, total_amount, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_order).transpose()
    }

    /// Gets all lines of an order, in insertion order.
    pub async fn get_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price_at_purchase, status
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_line).collect()
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: i64, limit: u32) -> DbResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, status, is_paid, total_amount, created_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    /// Gets a line together with the owner of its product.
    ///
    /// The join feeds the fulfillment authorization check: only staff or
    /// the seller who owns the line's product may change its status.
    pub async fn get_line_with_owner(&self, line_id: i64) -> DbResult<Option<(OrderLine, i64)>> {
        let row = sqlx::query(
            r#"
            SELECT
                oi.id, oi.order_id, oi.product_id, oi.quantity,
                oi.price_at_purchase, oi.status,
                p.owner_id
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.id = ?1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let owner_id: i64 = row.try_get("owner_id")?;
            Ok((row_to_line(row)?, owner_id))
        })
        .transpose()
    }

    /// Updates a line's fulfillment status.
    ///
    /// The status value is already validated (it is a [`LineStatus`], not a
    /// raw string); authorization happens in the storefront layer.
    pub async fn update_line_status(&self, line_id: i64, status: LineStatus) -> DbResult<()> {
        debug!(line_id, status = %status, "Updating order line status");

        let result = sqlx::query(
            r#"
            UPDATE order_items SET status = ?2 WHERE id = ?1
            "#,
        )
        .bind(line_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order line", line_id));
        }

        Ok(())
    }
}

/// Maps an order header row to the domain type.
pub(crate) fn row_to_order(row: SqliteRow) -> DbResult<Order> {
    let status_text: String = row.try_get("status")?;
    let total_text: String = row.try_get("total_amount")?;

    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        status: status_text
            .parse::<OrderStatus>()
            .map_err(|e| DbError::Decode(e.to_string()))?,
        is_paid: row.try_get("is_paid")?,
        total_amount: total_text.parse::<Money>()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// Maps an order line row to the domain type.
pub(crate) fn row_to_line(row: SqliteRow) -> DbResult<OrderLine> {
    let status_text: String = row.try_get("status")?;
    let price_text: String = row.try_get("price_at_purchase")?;

    Ok(OrderLine {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price_at_purchase: price_text.parse::<Money>()?,
        status: status_text
            .parse::<LineStatus>()
            .map_err(|e| DbError::Decode(e.to_string()))?,
    })
}
