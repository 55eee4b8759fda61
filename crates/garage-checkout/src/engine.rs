//! # Checkout Engine
//!
//! Orchestrates one checkout against a [`CheckoutStore`].
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VALIDATED (garage-core)                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  LOCATION_VERIFIED ── unknown location ──────────────► FAILED           │
//! │     │                                                    ▲              │
//! │     ▼                                                    │              │
//! │  CATALOG_RESOLVED (battery sale?)                        │              │
//! │     │                                                    │              │
//! │     ▼                                                    │              │
//! │  per line: ServiceCharge → skip                          │              │
//! │            Lubricant     → bottle ledger ────────────────┤              │
//! │            other         → FIFO allocator ───────────────┤              │
//! │     │                                                    │              │
//! │     ▼                                                    │              │
//! │  TRADE_INS_APPLIED ──────────────────────────────────────┤              │
//! │     │                                                    │              │
//! │     ▼                                                    │              │
//! │  PERSISTED (transaction skeleton + trade-in rows) ───────┤              │
//! │     │                                                    │              │
//! │     ▼                                                    │              │
//! │  RECEIPT_RENDERED + attached ────────────────────────────┘              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  returned to the caller, who commits (any Err → rollback)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are processed strictly in cart order.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use garage_core::pricing::{calculate_total, generate_reference_number};
use garage_core::quantity::parse_bottle_size;
use garage_core::{
    CartLine, CheckoutInput, CoreError, CoreResult, HtmlReceiptRenderer, LineItemKind,
    ProductCatalog, ReceiptData, ReceiptRenderer, TradeInRecord, Transaction, TransactionType,
};

use crate::bottles::{self, BottleMovement};
use crate::fifo::{self, BatchAllocation, MissingBatchPolicy};
use crate::store::CheckoutStore;
use crate::trade_in::{self, TradeInRestock};

/// Business-rule switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckoutPolicy {
    pub missing_batch: MissingBatchPolicy,
}

/// What happened to one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEffect {
    ServiceCharge,
    Batch(BatchAllocation),
    Bottle(BottleMovement),
}

/// Result of a successful checkout, before commit.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub transaction: Transaction,
    pub is_battery: bool,
    pub lines: Vec<LineEffect>,
    pub trade_ins: Vec<TradeInRestock>,
}

impl CheckoutOutcome {
    pub fn receipt_html(&self) -> Option<&str> {
        self.transaction.receipt_html.as_deref()
    }

    pub fn battery_bill_html(&self) -> Option<&str> {
        self.transaction.battery_bill_html.as_deref()
    }
}

/// Applies validated checkouts.
///
/// ## Usage
/// ```rust,ignore
/// let engine = CheckoutEngine::new(CheckoutPolicy::default());
/// let outcome = engine.process(&mut store, &input).await?;
/// // caller commits the store's transaction
/// ```
#[derive(Debug, Clone)]
pub struct CheckoutEngine<R = HtmlReceiptRenderer> {
    policy: CheckoutPolicy,
    renderer: R,
}

impl CheckoutEngine<HtmlReceiptRenderer> {
    pub fn new(policy: CheckoutPolicy) -> Self {
        CheckoutEngine {
            policy,
            renderer: HtmlReceiptRenderer,
        }
    }
}

impl Default for CheckoutEngine<HtmlReceiptRenderer> {
    fn default() -> Self {
        CheckoutEngine::new(CheckoutPolicy::default())
    }
}

impl<R: ReceiptRenderer> CheckoutEngine<R> {
    pub fn with_renderer(policy: CheckoutPolicy, renderer: R) -> Self {
        CheckoutEngine { policy, renderer }
    }

    pub fn policy(&self) -> CheckoutPolicy {
        self.policy
    }

    /// Runs the whole checkout inside `store`'s transaction.
    ///
    /// Every error leaves partial writes in the store; the caller must roll
    /// back.
    pub async fn process(
        &self,
        store: &mut dyn CheckoutStore,
        input: &CheckoutInput,
    ) -> CoreResult<CheckoutOutcome> {
        if !store.location_exists(input.location_id).await? {
            return Err(CoreError::LocationNotFound(input.location_id.to_string()));
        }

        let total_amount = calculate_total(&input.cart, &input.trade_ins)?;

        let product_ids = input.referenced_product_ids();
        let catalog = ProductCatalog::new(store.product_summaries(&product_ids).await?);
        let is_battery = catalog.is_battery_sale();
        debug!(
            requested = product_ids.len(),
            resolved = catalog.len(),
            is_battery,
            "Resolved catalog"
        );

        let mut lines = Vec::with_capacity(input.cart.len());
        for (index, line) in input.cart.iter().enumerate() {
            let effect = self.apply_line(store, &catalog, input.location_id, line).await?;
            debug!(index, effect = ?effect, "Applied cart line");
            lines.push(effect);
        }

        let mut trade_ins = Vec::with_capacity(input.trade_ins.len());
        for trade_in in &input.trade_ins {
            let restocked =
                trade_in::restock(store, &catalog, input.location_id, trade_in, is_battery).await?;
            trade_ins.push(restocked);
        }

        let now = Utc::now();
        let transaction_type = TransactionType::from_payment_method(&input.payment_method);

        let mut transaction = Transaction {
            id: Uuid::new_v4(),
            reference_number: generate_reference_number(now),
            location_id: input.location_id,
            shop_id: input.shop_id,
            cashier_id: input.cashier_id.clone(),
            transaction_type,
            total_amount,
            items_sold: input.items_sold.clone(),
            payment_method: input.payment_method.clone(),
            car_plate_number: input
                .car_plate_number
                .clone()
                .filter(|_| transaction_type.keeps_car_plate()),
            customer_id: input.customer_id.clone(),
            receipt_html: None,
            battery_bill_html: None,
            created_at: now,
        };
        store.insert_transaction(&transaction).await?;

        for trade_in in &input.trade_ins {
            let record = TradeInRecord {
                id: Uuid::new_v4(),
                transaction_id: transaction.id,
                product_id: trade_in.product_id,
                quantity: trade_in.quantity,
                trade_in_value_minor: trade_in.trade_in_value.minor(),
                created_at: now,
            };
            store.insert_trade_in(&record).await?;
        }

        let receipt = ReceiptData::from_checkout(
            input,
            &catalog,
            &transaction.reference_number,
            total_amount,
            now,
        );
        if is_battery {
            transaction.battery_bill_html = Some(self.renderer.render_battery_bill(&receipt)?);
        } else {
            transaction.receipt_html = Some(self.renderer.render_receipt(&receipt)?);
        }
        store
            .attach_receipt(
                transaction.id,
                transaction.receipt_html.as_deref(),
                transaction.battery_bill_html.as_deref(),
            )
            .await?;

        info!(
            transaction_id = %transaction.id,
            reference_number = %transaction.reference_number,
            transaction_type = transaction_type.as_str(),
            total = %total_amount,
            items = input.cart.len(),
            trade_ins = input.trade_ins.len(),
            is_battery,
            "Checkout applied"
        );

        Ok(CheckoutOutcome {
            transaction,
            is_battery,
            lines,
            trade_ins,
        })
    }

    async fn apply_line(
        &self,
        store: &mut dyn CheckoutStore,
        catalog: &ProductCatalog,
        location_id: Uuid,
        line: &CartLine,
    ) -> CoreResult<LineEffect> {
        let product_id = match line.kind {
            LineItemKind::ServiceCharge => return Ok(LineEffect::ServiceCharge),
            LineItemKind::InventoryProduct(id) => id,
        };

        let inventory = store
            .find_inventory(product_id, location_id)
            .await?
            .ok_or(CoreError::InventoryNotFound {
                product_id,
                location_id,
            })?;

        if catalog.is_lubricant(&product_id) {
            let size = parse_bottle_size(line.volume_description.as_deref());
            let movement = bottles::pour(
                store,
                &inventory,
                line.source,
                line.quantity.as_litres(),
                size,
            )
            .await?;
            return Ok(LineEffect::Bottle(movement));
        }

        let units = line
            .quantity
            .whole_units()
            .ok_or(CoreError::FractionalQuantity {
                product_id,
                quantity: line.quantity,
            })?;
        let allocation =
            fifo::sell_units(store, &inventory, units, self.policy.missing_batch).await?;
        Ok(LineEffect::Batch(allocation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDatabase;
    use chrono::Duration;
    use garage_core::{
        parse_checkout_request, Batch, BottleSource, ErrorKind, Inventory, OpenBottle, Volume,
    };
    use serde_json::json;

    struct Shop {
        db: MemoryDatabase,
        location: Uuid,
        oil: Uuid,
        oil_inventory: Inventory,
        filter: Uuid,
        filter_inventory: Inventory,
        battery: Uuid,
        battery_inventory: Inventory,
    }

    fn batch(inventory_id: Uuid, days_ago: i64, remaining: i64, active: bool) -> Batch {
        Batch {
            id: Uuid::new_v4(),
            inventory_id,
            cost_price_minor: 2_000,
            quantity_received: remaining,
            stock_remaining: remaining,
            supplier: Some("Supplier".to_string()),
            purchase_date: Utc::now() - Duration::days(days_ago),
            is_active_batch: active,
        }
    }

    fn shop() -> Shop {
        let mut db = MemoryDatabase::new();
        let location = db.add_location("Main Branch");

        let oil = db.add_product("Engine Oil 5W-30", Some("Lubricants"), Some("Engine Oil"));
        let oil_inventory = db.add_inventory(oil, location, 0, 0, 2);

        let filter = db.add_product("Oil Filter", Some("Filters"), None);
        let filter_inventory = db.add_inventory(filter, location, 15, 0, 0);
        db.add_batch(batch(filter_inventory.id, 2, 5, true));
        db.add_batch(batch(filter_inventory.id, 1, 10, false));

        let battery = db.add_product("Battery NS60", Some("Parts"), Some("Batteries"));
        let battery_inventory = db.add_inventory(battery, location, 4, 0, 0);
        db.add_batch(batch(battery_inventory.id, 1, 4, true));

        Shop {
            db,
            location,
            oil,
            oil_inventory,
            filter,
            filter_inventory,
            battery,
            battery_inventory,
        }
    }

    fn input(location: Uuid, cart: serde_json::Value) -> CheckoutInput {
        input_with(location, cart, json!([]), "cash")
    }

    fn input_with(
        location: Uuid,
        cart: serde_json::Value,
        trade_ins: serde_json::Value,
        payment_method: &str,
    ) -> CheckoutInput {
        let body = json!({
            "locationId": location,
            "paymentMethod": payment_method,
            "cashierId": "cashier-1",
            "cart": cart,
            "tradeIns": trade_ins,
            "carPlateNumber": "12345 AB",
        });
        parse_checkout_request(&serde_json::to_vec(&body).unwrap()).unwrap()
    }

    async fn run(
        shop: &mut Shop,
        engine: &CheckoutEngine,
        input: &CheckoutInput,
    ) -> CoreResult<CheckoutOutcome> {
        let mut tx = shop.db.begin();
        let result = engine.process(&mut tx, input).await;
        if result.is_ok() {
            shop.db.commit(tx);
        }
        result
    }

    #[tokio::test]
    async fn test_end_to_end_closed_lubricant_sale() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": shop.oil, "quantity": 1, "sellingPrice": 10,
                     "volumeDescription": "4L", "source": "CLOSED" }]),
        );

        let outcome = run(&mut shop, &engine, &input).await.unwrap();

        let inventory = shop.db.inventory(shop.oil_inventory.id);
        assert_eq!(inventory.closed_bottles_stock, 1);
        assert_eq!(inventory.open_bottles_stock, 1);

        let bottles: Vec<OpenBottle> = shop.db.bottles_for(shop.oil_inventory.id);
        assert_eq!(bottles.len(), 1);
        assert_eq!(bottles[0].initial_volume(), Volume::from_ml(4_000));
        assert_eq!(bottles[0].current_volume(), Volume::from_ml(3_000));
        assert!(!bottles[0].is_empty);

        assert!(!outcome.is_battery);
        assert!(outcome.receipt_html().is_some());
        assert!(outcome.battery_bill_html().is_none());
        assert_eq!(outcome.transaction.total_amount.minor(), 10_000);
        assert_eq!(outcome.transaction.transaction_type, TransactionType::Sale);
        assert_eq!(outcome.transaction.car_plate_number, None);
        assert_eq!(outcome.transaction.shop_id, shop.location);

        let stored = shop.db.transaction(outcome.transaction.id);
        assert_eq!(stored.reference_number, outcome.transaction.reference_number);
        assert_eq!(stored.receipt_html, outcome.transaction.receipt_html);
        assert_eq!(stored.items_sold[0]["source"], "CLOSED");
    }

    #[tokio::test]
    async fn test_missing_source_sells_from_closed_bottles() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": shop.oil, "quantity": 0.5, "sellingPrice": 3 }]),
        );
        assert_eq!(input.cart[0].source, BottleSource::Closed);

        run(&mut shop, &engine, &input).await.unwrap();

        let bottles = shop.db.bottles_for(shop.oil_inventory.id);
        assert_eq!(bottles[0].current_volume(), Volume::from_ml(3_500));
        assert_eq!(shop.db.inventory(shop.oil_inventory.id).closed_bottles_stock, 1);
    }

    #[tokio::test]
    async fn test_fifo_across_two_checkouts() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let batches = shop.db.batches_for(shop.filter_inventory.id);
        let (b1, b2) = if batches[0].is_active_batch {
            (batches[0].id, batches[1].id)
        } else {
            (batches[1].id, batches[0].id)
        };

        let sell = |qty: i64| {
            input(
                shop.location,
                json!([{ "productId": shop.filter, "quantity": qty, "sellingPrice": 4.5 }]),
            )
        };
        let first = sell(5);
        let second = sell(1);

        run(&mut shop, &engine, &first).await.unwrap();
        assert_eq!(shop.db.batch(b1).stock_remaining, 0);
        assert!(!shop.db.batch(b1).is_active_batch);
        assert!(shop.db.batch(b2).is_active_batch);

        run(&mut shop, &engine, &second).await.unwrap();
        assert_eq!(shop.db.batch(b2).stock_remaining, 9);
        assert_eq!(shop.db.inventory(shop.filter_inventory.id).standard_stock, 9);
        assert_eq!(shop.db.active_batch_count(shop.filter_inventory.id), 1);
    }

    #[tokio::test]
    async fn test_failure_on_last_line_rolls_back_everything() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let before = shop.db.clone();

        let input = input(
            shop.location,
            json!([
                { "productId": shop.oil, "quantity": 1, "sellingPrice": 10, "source": "CLOSED" },
                { "productId": shop.filter, "quantity": 2, "sellingPrice": 4.5 },
                { "productId": shop.filter, "quantity": 50, "sellingPrice": 4.5 }
            ]),
        );

        let err = run(&mut shop, &engine, &input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessLogic);

        assert_eq!(shop.db, before);
        assert!(shop.db.transactions().is_empty());
        assert_eq!(shop.db.inventory(shop.oil_inventory.id).closed_bottles_stock, 2);
        assert_eq!(shop.db.inventory(shop.filter_inventory.id).standard_stock, 15);
    }

    #[tokio::test]
    async fn test_open_bottle_overdraw_is_rejected() {
        let mut shop = shop();
        shop.db.add_open_bottle(OpenBottle {
            id: Uuid::new_v4(),
            inventory_id: shop.oil_inventory.id,
            initial_volume_ml: 4_000,
            current_volume_ml: 500,
            opened_at: Utc::now(),
            is_empty: false,
        });
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": shop.oil, "quantity": 1, "sellingPrice": 10, "source": "OPEN" }]),
        );

        let err = run(&mut shop, &engine, &input).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientBottleVolume { .. }));
        assert_eq!(
            shop.db.bottles_for(shop.oil_inventory.id)[0].current_volume(),
            Volume::from_ml(500)
        );
    }

    #[tokio::test]
    async fn test_battery_sale_renders_battery_bill() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": shop.battery, "quantity": 1, "sellingPrice": 38 }]),
        );

        let outcome = run(&mut shop, &engine, &input).await.unwrap();

        assert!(outcome.is_battery);
        assert!(outcome.receipt_html().is_none());
        let bill = outcome.battery_bill_html().unwrap();
        assert!(bill.contains("BATTERY PURCHASE RECEIPT"));
        assert!(bill.contains("Battery NS60"));
        assert_eq!(shop.db.inventory(shop.battery_inventory.id).standard_stock, 3);
    }

    #[tokio::test]
    async fn test_battery_trade_in_becomes_stock() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input_with(
            shop.location,
            json!([{ "productId": shop.battery, "quantity": 1, "sellingPrice": 38 }]),
            json!([{ "productId": shop.battery, "quantity": 1, "tradeInValue": 5,
                     "name": "Used NS60", "costPrice": 4, "condition": "Resalable" }]),
            "cash",
        );

        let outcome = run(&mut shop, &engine, &input).await.unwrap();

        assert_eq!(outcome.transaction.total_amount.minor(), 33_000);
        assert_eq!(outcome.trade_ins.len(), 1);
        assert!(outcome.trade_ins[0].created_product);

        let records = shop.db.trade_ins_for(outcome.transaction.id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_id, shop.battery);
        assert_eq!(records[0].trade_in_value_minor, 5_000);

        let used = shop.db.summary(outcome.trade_ins[0].product_id).unwrap();
        assert_eq!(used.name, "Used NS60");
        let batch = shop.db.batch(outcome.trade_ins[0].batch_id.unwrap());
        assert_eq!(batch.cost_price_minor, 4_000);
        assert!(batch.is_active_batch);
        assert!(outcome.battery_bill_html().unwrap().contains("Battery NS60 x1"));
    }

    #[tokio::test]
    async fn test_service_charge_skips_inventory() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let before = shop.db.clone();
        let input = input(
            shop.location,
            json!([{ "productId": "9999", "quantity": 1, "sellingPrice": 7.5 }]),
        );

        let outcome = run(&mut shop, &engine, &input).await.unwrap();

        assert_eq!(outcome.lines, vec![LineEffect::ServiceCharge]);
        assert_eq!(
            shop.db.inventory(shop.filter_inventory.id),
            before.inventory(shop.filter_inventory.id)
        );
        assert!(outcome.receipt_html().unwrap().contains("Service charge"));
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            Uuid::new_v4(),
            json!([{ "productId": shop.filter, "quantity": 1, "sellingPrice": 1 }]),
        );

        let err = run(&mut shop, &engine, &input).await.unwrap_err();
        assert!(matches!(err, CoreError::LocationNotFound(_)));
        assert_eq!(err.error_type(), "LOCATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_missing_inventory_is_not_found() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": Uuid::new_v4(), "quantity": 1, "sellingPrice": 1 }]),
        );

        let err = run(&mut shop, &engine, &input).await.unwrap_err();
        assert!(matches!(err, CoreError::InventoryNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fractional_unit_sale_is_rejected() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let input = input(
            shop.location,
            json!([{ "productId": shop.filter, "quantity": 1.5, "sellingPrice": 1 }]),
        );

        let err = run(&mut shop, &engine, &input).await.unwrap_err();
        assert!(matches!(err, CoreError::FractionalQuantity { .. }));
    }

    #[tokio::test]
    async fn test_reject_policy_blocks_sale_without_batches() {
        let mut shop = shop();
        let bare = shop.db.add_product("Wiper", Some("Parts"), Some("Wipers"));
        shop.db.add_inventory(bare, shop.location, 5, 0, 0);
        let input = input(
            shop.location,
            json!([{ "productId": bare, "quantity": 1, "sellingPrice": 2 }]),
        );

        let strict = CheckoutEngine::new(CheckoutPolicy {
            missing_batch: MissingBatchPolicy::Reject,
        });
        let err = run(&mut shop, &strict, &input).await.unwrap_err();
        assert!(matches!(err, CoreError::NoBatchAvailable { .. }));

        let relaxed = CheckoutEngine::default();
        let outcome = run(&mut shop, &relaxed, &input).await.unwrap();
        match &outcome.lines[0] {
            LineEffect::Batch(allocation) => assert!(allocation.fabricated),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_on_hold_keeps_car_plate_and_credit_type() {
        let mut shop = shop();
        let engine = CheckoutEngine::default();
        let cart = json!([{ "productId": "9999", "quantity": 1, "sellingPrice": 1 }]);

        let on_hold = input_with(shop.location, cart.clone(), json!([]), "On Hold");
        let outcome = run(&mut shop, &engine, &on_hold).await.unwrap();
        assert_eq!(outcome.transaction.transaction_type, TransactionType::OnHold);
        assert_eq!(outcome.transaction.car_plate_number.as_deref(), Some("12345 AB"));

        let credit = input_with(shop.location, cart, json!([]), "credit");
        let outcome = run(&mut shop, &engine, &credit).await.unwrap();
        assert_eq!(outcome.transaction.transaction_type, TransactionType::Credit);
        assert_eq!(outcome.transaction.car_plate_number, None);
    }
}
