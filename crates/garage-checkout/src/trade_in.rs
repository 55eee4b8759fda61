//! # Trade-In Restocking
//!
//! Puts traded-in items back on the shelf.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  battery sale AND trade-in has name/size + costPrice                    │
//! │     │                                                                   │
//! │     ├─yes─► product "Parts / Batteries" named after the trade-in        │
//! │     │       (looked up, created if missing)                             │
//! │     │       inventory += qty (created if missing)                       │
//! │     │       new batch: cost = costPrice, supplier "Trade-in"            │
//! │     │       active only if the row has no active batch yet              │
//! │     │                                                                   │
//! │     └─no──► inventory of trade-in product += qty (created if missing)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trade-in rows themselves are written by the engine once the
//! transaction exists.

use tracing::debug;
use uuid::Uuid;

use garage_core::catalog::{BATTERIES_TYPE, PARTS_CATEGORY};
use garage_core::{
    Batch, CoreError, CoreResult, Inventory, Product, ProductCatalog, TradeInLine,
    TRADE_IN_BATCH_SUPPLIER,
};

use crate::store::CheckoutStore;

/// Stock effect of one trade-in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeInRestock {
    /// Product whose stock went up.
    pub product_id: Uuid,
    pub inventory_id: Uuid,
    /// A used-battery product was created for this line.
    pub created_product: bool,
    /// Batch recorded for a battery trade-in.
    pub batch_id: Option<Uuid>,
}

/// Applies the stock effect of one trade-in line.
pub async fn restock(
    store: &mut dyn CheckoutStore,
    catalog: &ProductCatalog,
    location_id: Uuid,
    trade_in: &TradeInLine,
    battery_sale: bool,
) -> CoreResult<TradeInRestock> {
    if battery_sale {
        if let (Some(name), Some(cost_price)) = (trade_in.battery_product_name(), trade_in.cost_price)
        {
            let (product_id, created_product) = battery_product(store, name, trade_in).await?;
            let inventory_id =
                add_standard_stock(store, product_id, location_id, trade_in.quantity).await?;

            let has_active = store.active_batch(inventory_id).await?.is_some();
            let batch = Batch::received(
                inventory_id,
                cost_price,
                trade_in.quantity,
                TRADE_IN_BATCH_SUPPLIER,
                !has_active,
            );
            store.insert_batch(&batch).await?;

            debug!(
                product_id = %product_id,
                batch_id = %batch.id,
                active = !has_active,
                "Restocked battery trade-in"
            );

            return Ok(TradeInRestock {
                product_id,
                inventory_id,
                created_product,
                batch_id: Some(batch.id),
            });
        }
    }

    if catalog.get(&trade_in.product_id).is_none() {
        return Err(CoreError::ProductNotFound(trade_in.product_id));
    }

    let inventory_id =
        add_standard_stock(store, trade_in.product_id, location_id, trade_in.quantity).await?;

    debug!(product_id = %trade_in.product_id, quantity = trade_in.quantity, "Restocked trade-in");

    Ok(TradeInRestock {
        product_id: trade_in.product_id,
        inventory_id,
        created_product: false,
        batch_id: None,
    })
}

/// The used-battery catalog entry named `name`, created when missing.
async fn battery_product(
    store: &mut dyn CheckoutStore,
    name: &str,
    trade_in: &TradeInLine,
) -> CoreResult<(Uuid, bool)> {
    if let Some(id) = store
        .find_product_by_name(name, PARTS_CATEGORY, BATTERIES_TYPE)
        .await? {
        return Ok((id, false));
    }

    let category_id = store.find_or_create_category(PARTS_CATEGORY).await?;
    let description = match trade_in.condition {
        Some(condition) => format!("Used battery from trade-in ({})", condition.as_str()),
        None => "Used battery from trade-in".to_string(),
    };

    let product = Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_id: Some(category_id),
        product_type: Some(BATTERIES_TYPE.to_string()),
        description: Some(description),
    };
    store.insert_product(&product).await?;

    debug!(product_id = %product.id, name, "Created used-battery product");
    Ok((product.id, true))
}

/// Adds to standard stock, creating the inventory row when missing.
async fn add_standard_stock(
    store: &mut dyn CheckoutStore,
    product_id: Uuid,
    location_id: Uuid,
    quantity: i64,
) -> CoreResult<Uuid> {
    match store.find_inventory(product_id, location_id).await? {
        Some(inventory) => {
            store
                .set_standard_stock(inventory.id, inventory.standard_stock + quantity)
                .await?;
            Ok(inventory.id)
        }
        None => {
            let inventory = Inventory::with_standard_stock(product_id, location_id, quantity);
            store.insert_inventory(&inventory).await?;
            Ok(inventory.id)
        }
    }
}
