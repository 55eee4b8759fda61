//! # Inventory Repository
//!
//! One row per (product, location) carrying the three stock counters.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use garage_core::Inventory;

const COLUMNS: &str =
    "id, product_id, location_id, standard_stock, open_bottles_stock, closed_bottles_stock";

/// Repository for inventory rows.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: PgPool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<Inventory>> {
        get(&self.pool, id).await
    }

    pub async fn insert(&self, inventory: &Inventory) -> DbResult<()> {
        insert(&self.pool, inventory).await
    }
}

pub async fn get<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> DbResult<Option<Inventory>> {
    let inventory = sqlx::query_as::<_, Inventory>(&format!(
        "SELECT {COLUMNS} FROM inventory WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(inventory)
}

/// The row for a product at a location, locked until the transaction ends.
pub async fn find_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    product_id: Uuid,
    location_id: Uuid,
) -> DbResult<Option<Inventory>> {
    let inventory = sqlx::query_as::<_, Inventory>(&format!(
        "SELECT {COLUMNS} FROM inventory WHERE product_id = $1 AND location_id = $2 FOR UPDATE"
    ))
    .bind(product_id)
    .bind(location_id)
    .fetch_optional(executor)
    .await?;
    Ok(inventory)
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, inventory: &Inventory) -> DbResult<()> {
    sqlx::query(&format!(
        "INSERT INTO inventory ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(inventory.id)
    .bind(inventory.product_id)
    .bind(inventory.location_id)
    .bind(inventory.standard_stock)
    .bind(inventory.open_bottles_stock)
    .bind(inventory.closed_bottles_stock)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_standard_stock<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    standard_stock: i64,
) -> DbResult<()> {
    sqlx::query("UPDATE inventory SET standard_stock = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(standard_stock)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn set_bottle_stock<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    open_bottles: i64,
    closed_bottles: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE inventory
        SET open_bottles_stock = $2, closed_bottles_stock = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(open_bottles)
    .bind(closed_bottles)
    .execute(executor)
    .await?;
    Ok(())
}
