//! # Domain Types
//!
//! Core domain types used throughout Garage POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Stored entities                                                        │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Inventory     │──►│     Batch       │   │   OpenBottle    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  cost_price     │   │  inventory_id   │       │
//! │  │  location_id    │   │  stock_remaining│   │  current_volume │       │
//! │  │  standard_stock │   │  purchase_date  │   │  opened_at      │       │
//! │  │  open / closed  │   │  is_active_batch│   │  is_empty       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  Transaction    │──►│ TradeInRecord   │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  Validated input                                                        │
//! │  CheckoutInput ─► CartLine (LineItemKind, BottleSource) + TradeInLine   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored entities derive `sqlx::FromRow` when the `sqlx` feature is on.
//! Money columns hold minor units and carry a `_minor` suffix; volumes are
//! millilitres with an `_ml` suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{self, Money};
use crate::quantity::{Quantity, Volume};

// =============================================================================
// Catalog
// =============================================================================

/// A store or branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
}

/// A product category ("Lubricants", "Parts", ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// A sellable catalog entry. Never mutated by a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub product_type: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock of one product at one location.
///
/// All three counters are kept non-negative by the checkout engine and by
/// `CHECK` constraints in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    /// Units of non-lubricant stock.
    pub standard_stock: i64,
    /// Partially used lubricant bottles.
    pub open_bottles_stock: i64,
    /// Sealed lubricant bottles.
    pub closed_bottles_stock: i64,
}

impl Inventory {
    /// A fresh row with only standard stock.
    pub fn with_standard_stock(product_id: Uuid, location_id: Uuid, standard_stock: i64) -> Self {
        Inventory {
            id: Uuid::new_v4(),
            product_id,
            location_id,
            standard_stock,
            open_bottles_stock: 0,
            closed_bottles_stock: 0,
        }
    }

    /// Sum of the three counters. Derived, never stored.
    #[inline]
    pub fn total_stock(&self) -> i64 {
        self.standard_stock + self.open_bottles_stock + self.closed_bottles_stock
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A cost lot for an inventory row.
///
/// ## FIFO Lifecycle
/// ```text
///   created (restock / trade-in / fabricated)
///        │
///        ▼
///   waiting ──(oldest with stock, no active batch)──► ACTIVE
///                                                      │
///                                      stock_remaining reaches 0
///                                                      │
///                                                      ▼
///                                                  exhausted
///                                   (next-oldest with stock becomes ACTIVE)
/// ```
///
/// At most one batch per inventory row is active at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub cost_price_minor: i64,
    pub quantity_received: i64,
    pub stock_remaining: i64,
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    pub is_active_batch: bool,
}

impl Batch {
    /// A new batch dated now.
    pub fn received(
        inventory_id: Uuid,
        cost_price: Money,
        quantity: i64,
        supplier: &str,
        is_active_batch: bool,
    ) -> Self {
        Batch {
            id: Uuid::new_v4(),
            inventory_id,
            cost_price_minor: cost_price.minor(),
            quantity_received: quantity,
            stock_remaining: quantity,
            supplier: Some(supplier.to_string()),
            purchase_date: Utc::now(),
            is_active_batch,
        }
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_minor(self.cost_price_minor)
    }
}

// =============================================================================
// Open Bottle
// =============================================================================

/// One physical, partially used lubricant bottle.
///
/// Retired bottles keep their row with `is_empty = true` and are never
/// revived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OpenBottle {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub initial_volume_ml: i64,
    pub current_volume_ml: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub is_empty: bool,
}

impl OpenBottle {
    #[inline]
    pub fn initial_volume(&self) -> Volume {
        Volume::from_ml(self.initial_volume_ml)
    }

    #[inline]
    pub fn current_volume(&self) -> Volume {
        Volume::from_ml(self.current_volume_ml)
    }
}

// =============================================================================
// Transaction Type
// =============================================================================

/// How a finished sale is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Sale,
    Credit,
    OnHold,
}

impl TransactionType {
    /// Value stored in the `type` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "SALE",
            TransactionType::Credit => "CREDIT",
            TransactionType::OnHold => "ON_HOLD",
        }
    }

    /// Parses a stored value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SALE" => Some(TransactionType::Sale),
            "CREDIT" => Some(TransactionType::Credit),
            "ON_HOLD" => Some(TransactionType::OnHold),
            _ => None,
        }
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        TransactionType::Sale
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// The persisted record of a completed checkout.
///
/// Exactly one of `receipt_html` and `battery_bill_html` is set once the
/// checkout has finished.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub reference_number: String,
    pub location_id: Uuid,
    pub shop_id: Uuid,
    pub cashier_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(serialize_with = "money::as_decimal")]
    #[ts(as = "String")]
    pub total_amount: Money,
    /// The cart exactly as submitted (after defaulting `source`).
    #[ts(as = "Vec<serde_json::Value>")]
    pub items_sold: serde_json::Value,
    pub payment_method: String,
    pub car_plate_number: Option<String>,
    pub customer_id: Option<String>,
    pub receipt_html: Option<String>,
    pub battery_bill_html: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One trade-in line linked to a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TradeInRecord {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub trade_in_value_minor: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Validated Checkout Input
// =============================================================================

/// Where a lubricant sale is poured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleSource {
    /// Open a sealed bottle.
    Closed,
    /// Pour from the oldest partially used bottle.
    Open,
}

impl BottleSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BottleSource::Closed => "CLOSED",
            BottleSource::Open => "OPEN",
        }
    }
}

impl Default for BottleSource {
    fn default() -> Self {
        BottleSource::Closed
    }
}

/// What a cart line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemKind {
    /// A catalog product with inventory at the location.
    InventoryProduct(Uuid),
    /// Labour or service. Never touches inventory.
    ServiceCharge,
}

/// Condition of a traded-in item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TradeInCondition {
    Scrap,
    Resalable,
}

impl TradeInCondition {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TradeInCondition::Scrap => "Scrap",
            TradeInCondition::Resalable => "Resalable",
        }
    }
}

/// A validated cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub kind: LineItemKind,
    pub quantity: Quantity,
    pub selling_price: Money,
    pub volume_description: Option<String>,
    pub source: BottleSource,
}

impl CartLine {
    /// The referenced product, unless this is a service charge.
    pub fn product_id(&self) -> Option<Uuid> {
        match self.kind {
            LineItemKind::InventoryProduct(id) => Some(id),
            LineItemKind::ServiceCharge => None,
        }
    }

    /// `selling_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.selling_price.times(self.quantity)
    }
}

/// A validated trade-in line.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeInLine {
    pub product_id: Uuid,
    /// Whole units.
    pub quantity: i64,
    /// Credit for the whole line (not per unit).
    pub trade_in_value: Money,
    /// Ad hoc name for battery trade-ins.
    pub name: Option<String>,
    /// Ad hoc per-unit cost for battery trade-ins.
    pub cost_price: Option<Money>,
    pub size: Option<String>,
    pub condition: Option<TradeInCondition>,
}

impl TradeInLine {
    /// Catalog name for a battery trade-in product, when the line carries
    /// enough to create one.
    pub fn battery_product_name(&self) -> Option<&str> {
        self.cost_price?;
        self.name
            .as_deref()
            .or(self.size.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// A fully validated checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub location_id: Uuid,
    /// Defaults to `location_id`.
    pub shop_id: Uuid,
    pub payment_method: String,
    pub cashier_id: String,
    pub cart: Vec<CartLine>,
    pub trade_ins: Vec<TradeInLine>,
    pub car_plate_number: Option<String>,
    pub customer_id: Option<String>,
    /// Snapshot of the submitted cart for `Transaction::items_sold`.
    pub items_sold: serde_json::Value,
}

impl CheckoutInput {
    /// Every product id referenced by the cart and the trade-ins, in first
    /// appearance order, without duplicates.
    pub fn referenced_product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        let cart_ids = self.cart.iter().filter_map(CartLine::product_id);
        let trade_in_ids = self.trade_ins.iter().map(|t| t.product_id);

        for id in cart_ids.chain(trade_in_ids) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_in(name: Option<&str>, size: Option<&str>, cost: Option<i64>) -> TradeInLine {
        TradeInLine {
            product_id: Uuid::new_v4(),
            quantity: 1,
            trade_in_value: Money::from_minor(5_000),
            name: name.map(String::from),
            cost_price: cost.map(Money::from_minor),
            size: size.map(String::from),
            condition: None,
        }
    }

    #[test]
    fn test_total_stock_is_sum() {
        let mut inv = Inventory::with_standard_stock(Uuid::new_v4(), Uuid::new_v4(), 4);
        inv.open_bottles_stock = 1;
        inv.closed_bottles_stock = 2;
        assert_eq!(inv.total_stock(), 7);
    }

    #[test]
    fn test_transaction_type_roundtrips_column_value() {
        for ty in [
            TransactionType::Sale,
            TransactionType::Credit,
            TransactionType::OnHold,
        ] {
            assert_eq!(TransactionType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(TransactionType::parse("VOID"), None);
    }

    #[test]
    fn test_bottle_source_default_is_closed() {
        assert_eq!(BottleSource::default(), BottleSource::Closed);
        assert_eq!(
            serde_json::to_string(&BottleSource::Open).unwrap(),
            "\"OPEN\""
        );
    }

    #[test]
    fn test_battery_product_name_needs_cost_price() {
        assert_eq!(
            trade_in(Some("NS60 12V"), None, Some(8_000)).battery_product_name(),
            Some("NS60 12V")
        );
        assert_eq!(
            trade_in(None, Some("N70"), Some(8_000)).battery_product_name(),
            Some("N70")
        );
        assert_eq!(trade_in(Some("NS60"), None, None).battery_product_name(), None);
        assert_eq!(trade_in(Some("  "), None, Some(1)).battery_product_name(), None);
    }

    #[test]
    fn test_referenced_product_ids_skips_service_charge_and_duplicates() {
        let p1 = Uuid::new_v4();
        let line = |kind| CartLine {
            kind,
            quantity: Quantity::from_units(1),
            selling_price: Money::zero(),
            volume_description: None,
            source: BottleSource::Closed,
        };
        let mut t = trade_in(None, None, None);
        t.product_id = p1;

        let input = CheckoutInput {
            location_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            payment_method: "cash".into(),
            cashier_id: "c1".into(),
            cart: vec![
                line(LineItemKind::InventoryProduct(p1)),
                line(LineItemKind::ServiceCharge),
            ],
            trade_ins: vec![t],
            car_plate_number: None,
            customer_id: None,
            items_sold: serde_json::Value::Null,
        };

        assert_eq!(input.referenced_product_ids(), vec![p1]);
    }
}
