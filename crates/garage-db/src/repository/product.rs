//! # Product Repository
//!
//! Products, their categories and the summaries the checkout classifies by.
//!
//! ## Summary Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products p LEFT JOIN categories c                                      │
//! │                                                                         │
//! │  id        │ name              │ category    │ product_type             │
//! │  ──────────┼───────────────────┼─────────────┼──────────────            │
//! │  3f1c...   │ Engine Oil 5W-30  │ Lubricants  │ Engine Oil   ← bottles   │
//! │  9a02...   │ NS60 12V          │ Parts       │ Batteries    ← battery   │
//! │  c77e...   │ Oil Filter        │ Filters     │ NULL         ← batches   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{PgExecutor, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use garage_core::{Product, ProductSummary};

/// Repository for product and category rows.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: PgPool) -> Self {
        ProductRepository { pool }
    }

    pub async fn summaries(&self, ids: &[Uuid]) -> DbResult<Vec<ProductSummary>> {
        summaries(&self.pool, ids).await
    }

    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        insert(&self.pool, product).await
    }

    pub async fn find_or_create_category(&self, name: &str) -> DbResult<Uuid> {
        find_or_create_category(&self.pool, name).await
    }
}

/// Summaries of the products that exist among `ids`.
pub async fn summaries<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> DbResult<Vec<ProductSummary>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let products = sqlx::query_as::<_, ProductSummary>(
        r#"
        SELECT
            p.id,
            p.name,
            c.name AS category,
            p.product_type
        FROM products p
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE p.id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    debug!(requested = ids.len(), found = products.len(), "Loaded product summaries");
    Ok(products)
}

/// Exact-name lookup within a category and product type.
pub async fn find_id_by_name<'e, E: PgExecutor<'e>>(
    executor: E,
    name: &str,
    category: &str,
    product_type: &str,
) -> DbResult<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT p.id
        FROM products p
        INNER JOIN categories c ON c.id = p.category_id
        WHERE p.name = $1 AND c.name = $2 AND p.product_type = $3
        ORDER BY p.created_at, p.id
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(category)
    .bind(product_type)
    .fetch_optional(executor)
    .await?;
    Ok(id)
}

/// Category id by name, inserting the category when it does not exist.
///
/// One statement, so concurrent callers converge on the same row.
pub async fn find_or_create_category<'e, E: PgExecutor<'e>>(
    executor: E,
    name: &str,
) -> DbResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, category_id, product_type, description)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(product.category_id)
    .bind(&product.product_type)
    .bind(&product.description)
    .execute(executor)
    .await?;
    Ok(())
}
