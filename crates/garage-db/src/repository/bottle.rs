//! # Open Bottle Repository
//!
//! Rows of `open_bottle_details`: one per lubricant bottle that has been
//! opened, kept after it runs dry with `is_empty = true`.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use garage_core::{OpenBottle, Volume};

const COLUMNS: &str =
    "id, inventory_id, initial_volume_ml, current_volume_ml, opened_at, is_empty";

/// Repository for open bottle rows.
#[derive(Debug, Clone)]
pub struct BottleRepository {
    pool: PgPool,
}

impl BottleRepository {
    /// Creates a new BottleRepository.
    pub fn new(pool: PgPool) -> Self {
        BottleRepository { pool }
    }

    /// All bottles of an inventory row, oldest first, empty ones included.
    pub async fn list_for(&self, inventory_id: Uuid) -> DbResult<Vec<OpenBottle>> {
        let bottles = sqlx::query_as::<_, OpenBottle>(&format!(
            "SELECT {COLUMNS} FROM open_bottle_details \
             WHERE inventory_id = $1 ORDER BY opened_at, id"
        ))
        .bind(inventory_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bottles)
    }
}

/// The oldest bottle that still holds oil, locked.
pub async fn oldest_open_for_update<'e, E: PgExecutor<'e>>(
    executor: E,
    inventory_id: Uuid,
) -> DbResult<Option<OpenBottle>> {
    let bottle = sqlx::query_as::<_, OpenBottle>(&format!(
        "SELECT {COLUMNS} FROM open_bottle_details \
         WHERE inventory_id = $1 AND NOT is_empty \
         ORDER BY opened_at, id LIMIT 1 FOR UPDATE"
    ))
    .bind(inventory_id)
    .fetch_optional(executor)
    .await?;
    Ok(bottle)
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, bottle: &OpenBottle) -> DbResult<()> {
    sqlx::query(&format!(
        "INSERT INTO open_bottle_details ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(bottle.id)
    .bind(bottle.inventory_id)
    .bind(bottle.initial_volume_ml)
    .bind(bottle.current_volume_ml)
    .bind(bottle.opened_at)
    .bind(bottle.is_empty)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_volume<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    current_volume: Volume,
    is_empty: bool,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE open_bottle_details SET current_volume_ml = $2, is_empty = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(current_volume.ml())
    .bind(is_empty)
    .execute(executor)
    .await?;
    Ok(())
}
