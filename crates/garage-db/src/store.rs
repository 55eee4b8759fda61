//! # PostgreSQL Checkout Store
//!
//! [`CheckoutStore`] bound to one open PostgreSQL transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Transaction<'_, Postgres>                                        │
//! │       │ &mut *tx                                                        │
//! │       ▼                                                                 │
//! │  PgCheckoutStore { conn: &mut PgConnection }                            │
//! │       │                                                                 │
//! │       ├── reads that precede a write ──► ... FOR UPDATE                 │
//! │       └── writes ──► repository::* executor functions                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store never commits. [`Database::checkout`](crate::Database::checkout)
//! owns the transaction and ends it.

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use garage_checkout::CheckoutStore;
use garage_core::{
    Batch, CoreResult, Inventory, OpenBottle, Product, ProductSummary, TradeInRecord, Transaction,
    Volume,
};

use crate::repository::{batch, bottle, inventory, location, product, transaction};

pub struct PgCheckoutStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgCheckoutStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        PgCheckoutStore { conn }
    }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore<'_> {
    async fn location_exists(&mut self, location_id: Uuid) -> CoreResult<bool> {
        Ok(location::exists(&mut *self.conn, location_id).await?)
    }

    async fn product_summaries(&mut self, product_ids: &[Uuid]) -> CoreResult<Vec<ProductSummary>> {
        Ok(product::summaries(&mut *self.conn, product_ids).await?)
    }

    async fn find_product_by_name(
        &mut self,
        name: &str,
        category: &str,
        product_type: &str,
    ) -> CoreResult<Option<Uuid>> {
        Ok(product::find_id_by_name(&mut *self.conn, name, category, product_type).await?)
    }

    async fn find_or_create_category(&mut self, name: &str) -> CoreResult<Uuid> {
        Ok(product::find_or_create_category(&mut *self.conn, name).await?)
    }

    async fn insert_product(&mut self, product: &Product) -> CoreResult<()> {
        Ok(product::insert(&mut *self.conn, product).await?)
    }

    async fn find_inventory(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> CoreResult<Option<Inventory>> {
        Ok(inventory::find_for_update(&mut *self.conn, product_id, location_id).await?)
    }

    async fn insert_inventory(&mut self, inventory: &Inventory) -> CoreResult<()> {
        Ok(inventory::insert(&mut *self.conn, inventory).await?)
    }

    async fn set_standard_stock(&mut self, inventory_id: Uuid, standard_stock: i64) -> CoreResult<()> {
        Ok(inventory::set_standard_stock(&mut *self.conn, inventory_id, standard_stock).await?)
    }

    async fn set_bottle_stock(
        &mut self,
        inventory_id: Uuid,
        open_bottles: i64,
        closed_bottles: i64,
    ) -> CoreResult<()> {
        Ok(
            inventory::set_bottle_stock(&mut *self.conn, inventory_id, open_bottles, closed_bottles)
                .await?,
        )
    }

    async fn active_batch(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>> {
        Ok(batch::active_for_update(&mut *self.conn, inventory_id).await?)
    }

    async fn oldest_batch_with_stock(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>> {
        Ok(batch::oldest_with_stock_for_update(&mut *self.conn, inventory_id).await?)
    }

    async fn insert_batch(&mut self, batch: &Batch) -> CoreResult<()> {
        Ok(batch::insert(&mut *self.conn, batch).await?)
    }

    async fn set_batch_stock(&mut self, batch_id: Uuid, stock_remaining: i64) -> CoreResult<()> {
        Ok(batch::set_stock(&mut *self.conn, batch_id, stock_remaining).await?)
    }

    async fn set_batch_active(&mut self, batch_id: Uuid, is_active: bool) -> CoreResult<()> {
        Ok(batch::set_active(&mut *self.conn, batch_id, is_active).await?)
    }

    async fn oldest_open_bottle(&mut self, inventory_id: Uuid) -> CoreResult<Option<OpenBottle>> {
        Ok(bottle::oldest_open_for_update(&mut *self.conn, inventory_id).await?)
    }

    async fn insert_open_bottle(&mut self, bottle: &OpenBottle) -> CoreResult<()> {
        Ok(bottle::insert(&mut *self.conn, bottle).await?)
    }

    async fn update_open_bottle(
        &mut self,
        bottle_id: Uuid,
        current_volume: Volume,
        is_empty: bool,
    ) -> CoreResult<()> {
        Ok(bottle::update_volume(&mut *self.conn, bottle_id, current_volume, is_empty).await?)
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> CoreResult<()> {
        Ok(transaction::insert(&mut *self.conn, transaction).await?)
    }

    async fn attach_receipt(
        &mut self,
        transaction_id: Uuid,
        receipt_html: Option<&str>,
        battery_bill_html: Option<&str>,
    ) -> CoreResult<()> {
        Ok(
            transaction::attach_receipt(&mut *self.conn, transaction_id, receipt_html, battery_bill_html)
                .await?,
        )
    }

    async fn insert_trade_in(&mut self, record: &TradeInRecord) -> CoreResult<()> {
        Ok(transaction::insert_trade_in(&mut *self.conn, record).await?)
    }
}

// =============================================================================
// Database Tests (need a live PostgreSQL: DATABASE_URL=... cargo test -- --ignored)
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use garage_checkout::CheckoutEngine;
    use garage_core::{parse_checkout_request, Batch, ErrorKind, Inventory, Location, Product};

    use crate::{Database, DbConfig};

    async fn database() -> Database {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        Database::connect(DbConfig::new(url).max_connections(2))
            .await
            .unwrap()
    }

    async fn product(db: &Database, name: &str, category: &str, product_type: Option<&str>) -> Uuid {
        let category_id = db.products().find_or_create_category(category).await.unwrap();
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category_id: Some(category_id),
            product_type: product_type.map(String::from),
            description: None,
        };
        db.products().insert(&product).await.unwrap();
        product.id
    }

    async fn location(db: &Database) -> Uuid {
        let location = Location {
            id: Uuid::new_v4(),
            name: "Test Branch".to_string(),
        };
        db.locations().insert(&location).await.unwrap();
        assert!(db.locations().get(location.id).await.unwrap().is_some());
        location.id
    }

    #[tokio::test]
    #[ignore]
    async fn test_closed_lubricant_checkout_commits() {
        let db = database().await;
        let location = location(&db).await;
        let oil = product(&db, "Engine Oil 10W-40", "Lubricants", None).await;
        let inventory = Inventory {
            id: Uuid::new_v4(),
            product_id: oil,
            location_id: location,
            standard_stock: 0,
            open_bottles_stock: 0,
            closed_bottles_stock: 2,
        };
        db.inventory().insert(&inventory).await.unwrap();

        let body = json!({
            "locationId": location,
            "paymentMethod": "cash",
            "cashierId": "it",
            "cart": [{ "productId": oil, "quantity": 1, "sellingPrice": 10,
                       "volumeDescription": "4L", "source": "CLOSED" }],
        });
        let input = parse_checkout_request(&serde_json::to_vec(&body).unwrap()).unwrap();
        let outcome = db.checkout(&CheckoutEngine::default(), &input).await.unwrap();

        let after = db.inventory().get(inventory.id).await.unwrap().unwrap();
        assert_eq!(after.closed_bottles_stock, 1);
        assert_eq!(after.open_bottles_stock, 1);

        let bottles = db.bottles().list_for(inventory.id).await.unwrap();
        assert_eq!(bottles.len(), 1);
        assert_eq!(bottles[0].current_volume_ml, 3_000);

        let stored = db
            .transactions()
            .get(outcome.transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.receipt_html.is_some());
        assert!(stored.battery_bill_html.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_failed_checkout_rolls_back() {
        let db = database().await;
        let location = location(&db).await;
        let filter = product(&db, "Air Filter", "Filters", None).await;
        let inventory = Inventory::with_standard_stock(filter, location, 6);
        db.inventory().insert(&inventory).await.unwrap();
        for (days_ago, units, active) in [(2, 5, true), (1, 1, false)] {
            db.batches()
                .insert(&Batch {
                    id: Uuid::new_v4(),
                    inventory_id: inventory.id,
                    cost_price_minor: 500,
                    quantity_received: units,
                    stock_remaining: units,
                    supplier: None,
                    purchase_date: Utc::now() - Duration::days(days_ago),
                    is_active_batch: active,
                })
                .await
                .unwrap();
        }

        let body = json!({
            "locationId": location,
            "paymentMethod": "cash",
            "cashierId": "it",
            "cart": [
                { "productId": filter, "quantity": 5, "sellingPrice": 2 },
                { "productId": filter, "quantity": 3, "sellingPrice": 2 }
            ],
        });
        let input = parse_checkout_request(&serde_json::to_vec(&body).unwrap()).unwrap();
        let err = db
            .checkout(&CheckoutEngine::default(), &input)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);

        let after = db.inventory().get(inventory.id).await.unwrap().unwrap();
        assert_eq!(after.standard_stock, 6);
        let batches = db.batches().list_for(inventory.id).await.unwrap();
        assert_eq!(batches[0].stock_remaining, 5);
        assert!(batches[0].is_active_batch);
        assert!(!batches[1].is_active_batch);
    }

    #[tokio::test]
    #[ignore]
    async fn test_battery_trade_in_rows_are_linked() {
        let db = database().await;
        let location = location(&db).await;
        let battery = product(&db, "Battery DIN74", "Parts", Some("Batteries")).await;
        let inventory = Inventory::with_standard_stock(battery, location, 2);
        db.inventory().insert(&inventory).await.unwrap();

        let body = json!({
            "locationId": location,
            "paymentMethod": "cash",
            "cashierId": "it",
            "cart": [{ "productId": battery, "quantity": 1, "sellingPrice": 45 }],
            "tradeIns": [{ "productId": battery, "quantity": 1, "tradeInValue": 6,
                           "size": "DIN74 used", "costPrice": 5 }],
        });
        let input = parse_checkout_request(&serde_json::to_vec(&body).unwrap()).unwrap();
        let outcome = db.checkout(&CheckoutEngine::default(), &input).await.unwrap();

        assert!(outcome.is_battery);
        let records = db.transactions().trade_ins(outcome.transaction.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trade_in_value_minor, 6_000);
    }
}
