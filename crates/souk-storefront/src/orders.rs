//! # Order Operations
//!
//! Read side of committed orders, plus the single post-creation mutation:
//! per-line fulfillment status.
//!
//! ## Authorization
//! - `order.view` / `order.list`: a buyer sees their own orders; staff and
//!   sellers may view any order.
//! - `order.line.update_status`: staff, or the seller who owns the line's
//!   product. Nothing here ever touches quantity, price or stock.

use serde::Serialize;
use tracing::{debug, info};

use souk_core::validation::validate_line_status;
use souk_core::{Order, OrderLine, Principal};

use crate::error::{StorefrontError, StorefrontResult};
use crate::Storefront;

/// An order header with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl Storefront {
    /// `order.view`: one order with its lines.
    ///
    /// Hidden (`NotFound`) rather than `PermissionDenied` for principals
    /// who may not see it, so order ids cannot be probed.
    pub async fn order_view(
        &self,
        principal: &Principal,
        order_id: i64,
    ) -> StorefrontResult<OrderDetail> {
        debug!(order_id, user_id = principal.user_id, "order.view");

        let order = self
            .db()
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or(StorefrontError::NotFound {
                entity: "Order",
                id: order_id,
            })?;

        if order.user_id != principal.user_id && !principal.is_seller() {
            return Err(StorefrontError::NotFound {
                entity: "Order",
                id: order_id,
            });
        }

        let lines = self.db().orders().get_lines(order_id).await?;

        Ok(OrderDetail { order, lines })
    }

    /// `order.list`: the principal's own orders, newest first.
    pub async fn order_list(
        &self,
        principal: &Principal,
        limit: u32,
    ) -> StorefrontResult<Vec<Order>> {
        debug!(user_id = principal.user_id, limit, "order.list");
        Ok(self
            .db()
            .orders()
            .list_for_user(principal.user_id, limit)
            .await?)
    }

    /// `order.line.update_status`: moves a line through its fulfillment
    /// lifecycle.
    ///
    /// ## Errors
    /// - `InvalidStatus` for values outside the enumerated set
    /// - `NotFound` when the line does not exist
    /// - `PermissionDenied` unless the principal is staff or owns the
    ///   line's product
    pub async fn order_line_update_status(
        &self,
        principal: &Principal,
        line_id: i64,
        raw_status: &str,
    ) -> StorefrontResult<OrderLine> {
        debug!(line_id, raw_status, user_id = principal.user_id, "order.line.update_status");

        let status = validate_line_status(raw_status)?;

        let (line, owner_id) = self
            .db()
            .orders()
            .get_line_with_owner(line_id)
            .await?
            .ok_or(StorefrontError::NotFound {
                entity: "Order line",
                id: line_id,
            })?;

        if !principal.is_staff && owner_id != principal.user_id {
            return Err(StorefrontError::PermissionDenied);
        }

        self.db().orders().update_line_status(line_id, status).await?;

        info!(line_id, status = %status, user_id = principal.user_id, "Order line status updated");

        Ok(OrderLine { status, ..line })
    }
}
