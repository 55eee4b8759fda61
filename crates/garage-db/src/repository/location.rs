//! # Location Repository

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use garage_core::Location;

/// Repository for location rows.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: PgPool) -> Self {
        LocationRepository { pool }
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<Location>> {
        get(&self.pool, id).await
    }

    pub async fn insert(&self, location: &Location) -> DbResult<()> {
        insert(&self.pool, location).await
    }
}

pub async fn exists<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> DbResult<bool> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM locations WHERE id = $1)")
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(found)
}

pub async fn get<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> DbResult<Option<Location>> {
    let location = sqlx::query_as::<_, Location>("SELECT id, name FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(location)
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, location: &Location) -> DbResult<()> {
    sqlx::query("INSERT INTO locations (id, name) VALUES ($1, $2)")
        .bind(location.id)
        .bind(&location.name)
        .execute(executor)
        .await?;
    Ok(())
}
