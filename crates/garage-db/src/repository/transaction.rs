//! # Transaction Repository
//!
//! Completed checkouts and the trade-in rows attached to them.
//!
//! ## Write Sequence During Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. insert()          row without receipt_html / battery_bill_html      │
//! │  2. insert_trade_in() one row per trade-in, FK → transactions.id        │
//! │  3. attach_receipt()  exactly one of the two documents                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use garage_core::{Money, TradeInRecord, Transaction, TransactionType};

/// Repository for transaction rows.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: PgPool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id, reference_number, location_id, shop_id, cashier_id,
                type AS transaction_type, total_amount_minor, items_sold,
                payment_method, car_plate_number, customer_id,
                receipt_html, battery_bill_html, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Transaction::try_from).transpose()
    }

    pub async fn trade_ins(&self, transaction_id: Uuid) -> DbResult<Vec<TradeInRecord>> {
        let records = sqlx::query_as::<_, TradeInRecord>(
            r#"
            SELECT id, transaction_id, product_id, quantity, trade_in_value_minor, created_at
            FROM trade_in_transactions
            WHERE transaction_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, transaction: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, reference_number, location_id, shop_id, cashier_id,
            type, total_amount_minor, items_sold,
            payment_method, car_plate_number, customer_id,
            receipt_html, battery_bill_html, created_at
        ) VALUES (
            $1, $2, $3, $4, $5,
            $6, $7, $8,
            $9, $10, $11,
            $12, $13, $14
        )
        "#,
    )
    .bind(transaction.id)
    .bind(&transaction.reference_number)
    .bind(transaction.location_id)
    .bind(transaction.shop_id)
    .bind(&transaction.cashier_id)
    .bind(transaction.transaction_type.as_str())
    .bind(transaction.total_amount.minor())
    .bind(&transaction.items_sold)
    .bind(&transaction.payment_method)
    .bind(&transaction.car_plate_number)
    .bind(&transaction.customer_id)
    .bind(&transaction.receipt_html)
    .bind(&transaction.battery_bill_html)
    .bind(transaction.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn attach_receipt<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    receipt_html: Option<&str>,
    battery_bill_html: Option<&str>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE transactions SET receipt_html = $2, battery_bill_html = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(receipt_html)
    .bind(battery_bill_html)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Transaction", id));
    }
    Ok(())
}

pub async fn insert_trade_in<'e, E: PgExecutor<'e>>(
    executor: E,
    record: &TradeInRecord,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO trade_in_transactions (
            id, transaction_id, product_id, quantity, trade_in_value_minor, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.id)
    .bind(record.transaction_id)
    .bind(record.product_id)
    .bind(record.quantity)
    .bind(record.trade_in_value_minor)
    .bind(record.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    reference_number: String,
    location_id: Uuid,
    shop_id: Uuid,
    cashier_id: String,
    transaction_type: String,
    total_amount_minor: i64,
    items_sold: serde_json::Value,
    payment_method: String,
    car_plate_number: Option<String>,
    customer_id: Option<String>,
    receipt_html: Option<String>,
    battery_bill_html: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<Self> {
        let transaction_type = TransactionType::parse(&row.transaction_type).ok_or_else(|| {
            DbError::Internal(format!(
                "transaction {} has unknown type {:?}",
                row.id, row.transaction_type
            ))
        })?;

        Ok(Transaction {
            id: row.id,
            reference_number: row.reference_number,
            location_id: row.location_id,
            shop_id: row.shop_id,
            cashier_id: row.cashier_id,
            transaction_type,
            total_amount: Money::from_minor(row.total_amount_minor),
            items_sold: row.items_sold,
            payment_method: row.payment_method,
            car_plate_number: row.car_plate_number,
            customer_id: row.customer_id,
            receipt_html: row.receipt_html,
            battery_bill_html: row.battery_bill_html,
            created_at: row.created_at,
        })
    }
}
