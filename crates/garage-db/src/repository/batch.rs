//! # Batch Repository
//!
//! FIFO cost batches. Ordering is always `purchase_date, id` so ties
//! resolve the same way on every query.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use garage_core::Batch;

const COLUMNS: &str = "id, inventory_id, cost_price_minor, quantity_received, stock_remaining, \
                       supplier, purchase_date, is_active_batch";

/// Repository for batch rows.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: PgPool) -> Self {
        BatchRepository { pool }
    }

    pub async fn insert(&self, batch: &Batch) -> DbResult<()> {
        insert(&self.pool, batch).await
    }

    /// All batches of an inventory row, oldest first.
    pub async fn list_for(&self, inventory_id: Uuid) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {COLUMNS} FROM batches WHERE inventory_id = $1 ORDER BY purchase_date, id"
        ))
        .bind(inventory_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(batches)
    }
}

/// The active batch, locked.
pub async fn active_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    inventory_id: Uuid,
) -> DbResult<Option<Batch>> {
    let batch = sqlx::query_as::<_, Batch>(&format!(
        "SELECT {COLUMNS} FROM batches \
         WHERE inventory_id = $1 AND is_active_batch \
         ORDER BY purchase_date, id LIMIT 1 FOR UPDATE"
    ))
    .bind(inventory_id)
    .fetch_optional(executor)
    .await?;
    Ok(batch)
}

/// The oldest batch with stock left, locked.
pub async fn oldest_with_stock_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    inventory_id: Uuid,
) -> DbResult<Option<Batch>> {
    let batch = sqlx::query_as::<_, Batch>(&format!(
        "SELECT {COLUMNS} FROM batches \
         WHERE inventory_id = $1 AND stock_remaining > 0 \
         ORDER BY purchase_date, id LIMIT 1 FOR UPDATE"
    ))
    .bind(inventory_id)
    .fetch_optional(executor)
    .await?;
    Ok(batch)
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, batch: &Batch) -> DbResult<()> {
    sqlx::query(&format!(
        "INSERT INTO batches ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    ))
    .bind(batch.id)
    .bind(batch.inventory_id)
    .bind(batch.cost_price_minor)
    .bind(batch.quantity_received)
    .bind(batch.stock_remaining)
    .bind(&batch.supplier)
    .bind(batch.purchase_date)
    .bind(batch.is_active_batch)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_stock<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    stock_remaining: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE batches SET stock_remaining = $2 WHERE id = $1")
        .bind(id)
        .bind(stock_remaining)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_active<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    is_active: bool,
) -> DbResult<()> {
    sqlx::query("UPDATE batches SET is_active_batch = $2 WHERE id = $1")
        .bind(id)
        .bind(is_active)
        .execute(executor)
        .await?;
    Ok(())
}
