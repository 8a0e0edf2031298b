//! # Product Repository
//!
//! Read-side catalog access for the checkout core, plus the insert used by
//! seeding and tests.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reads here are for DISPLAY and cart sanitation only. They are          │
//! │  eventually-consistent and never the final admission decision:          │
//! │  the checkout transaction re-reads every product under its write        │
//! │  lock. No method in this repository mutates stock.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use souk_core::{Money, Product};

/// Fields for a new catalog row.
///
/// Catalog management is an external collaborator's job; this exists for
/// seeding and tests.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub owner_id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub is_active: bool,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_sellable(42).await?;
/// let in_cart = repo.get_sellable_many(&[42, 57]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id, regardless of sellability.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, price, stock, is_active, created_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    /// Gets a product by id, filtered to sellable items.
    ///
    /// This is the lookup every cart mutation starts from: an inactive
    /// product is indistinguishable from an absent one.
    pub async fn get_sellable(&self, id: i64) -> DbResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, price, stock, is_active, created_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    /// Gets a set of sellable products by id, in one query.
    ///
    /// Used by cart views and the sanitation pass. Absent and inactive ids
    /// are simply missing from the result; callers treat the gap as "drop
    /// that line".
    pub async fn get_sellable_many(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = ids.len(), "Fetching sellable products by id set");

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, owner_id, name, price, stock, is_active, created_at \
             FROM products WHERE id IN ({placeholders}) AND is_active = 1 \
             ORDER BY id"
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    /// Lists sellable products, newest first.
    pub async fn list_sellable(&self, limit: u32) -> DbResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, price, stock, is_active, created_at
            FROM products
            WHERE is_active = 1
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// The inserted product with its generated id.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (owner_id, name, price, stock, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(new.price.to_string())
        .bind(new.stock)
        .bind(new.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Product {
            id: result.last_insert_rowid(),
            owner_id: new.owner_id,
            name: new.name.clone(),
            price: new.price,
            stock: new.stock,
            is_active: new.is_active,
            created_at: now,
        })
    }

    /// Counts sellable products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Maps a product row to the domain type.
///
/// Money and status columns are TEXT; decode failures surface as
/// [`DbError::Decode`] rather than panicking.
pub(crate) fn row_to_product(row: SqliteRow) -> DbResult<Product> {
    let price_text: String = row.try_get("price").map_err(DbError::from)?;

    Ok(Product {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        price: price_text.parse::<Money>()?,
        stock: row.try_get("stock")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
