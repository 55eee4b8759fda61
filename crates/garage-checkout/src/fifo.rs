//! # FIFO Batch Allocator
//!
//! Sells unit-stocked products out of the oldest cost batch.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sell 5 units                                                           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  standard_stock ≥ 5 ? ──no──► InsufficientStandardStock                 │
//! │     │ yes                                                               │
//! │     ▼                                                                   │
//! │  active batch? ──no──► oldest batch with stock? ──no──► policy          │
//! │     │ yes                     │ yes (activate)         Fabricate/Reject │
//! │     ▼◄────────────────────────┘◄────────────────────────┘               │
//! │  stock_remaining ≥ 5 ? ──no──► InsufficientBatchStock                   │
//! │     │ yes                                                               │
//! │     ▼                                                                   │
//! │  stock_remaining −= 5                                                   │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  reached 0 ? ──yes──► deactivate, then activate next-oldest with stock  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  standard_stock −= 5                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A line is never split across batches. Deactivation always happens
//! before the next batch is activated, so at most one batch is active at
//! any point inside the transaction.

use tracing::{debug, warn};
use uuid::Uuid;

use garage_core::{
    Batch, CoreError, CoreResult, Inventory, Money, FABRICATED_BATCH_STOCK,
    FABRICATED_BATCH_SUPPLIER,
};

use crate::store::CheckoutStore;

/// What to do when an inventory row has no batch with stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingBatchPolicy {
    /// Create a zero-cost "System Generated" batch and carry on.
    #[default]
    Fabricate,
    /// Fail the line.
    Reject,
}

impl MissingBatchPolicy {
    /// Parses `fabricate` / `reject`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fabricate" => Some(MissingBatchPolicy::Fabricate),
            "reject" => Some(MissingBatchPolicy::Reject),
            _ => None,
        }
    }
}

/// Result of selling from one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAllocation {
    pub batch_id: Uuid,
    pub cost_price: Money,
    pub units: i64,
    /// Stock left in the batch after this line.
    pub stock_remaining: i64,
    /// Batch activated because this one ran out.
    pub next_active: Option<Uuid>,
    /// The batch was created on the spot by [`MissingBatchPolicy::Fabricate`].
    pub fabricated: bool,
}

/// Sells `units` whole units of `inventory`.
pub async fn sell_units(
    store: &mut dyn CheckoutStore,
    inventory: &Inventory,
    units: i64,
    policy: MissingBatchPolicy,
) -> CoreResult<BatchAllocation> {
    if inventory.standard_stock < units {
        return Err(CoreError::InsufficientStandardStock {
            product_id: inventory.product_id,
            available: inventory.standard_stock,
            required: units,
        });
    }

    let (batch, fabricated) = head_batch(store, inventory, policy).await?;

    if batch.stock_remaining < units {
        return Err(CoreError::InsufficientBatchStock {
            batch_id: batch.id,
            available: batch.stock_remaining,
            required: units,
        });
    }

    let stock_remaining = batch.stock_remaining - units;
    store.set_batch_stock(batch.id, stock_remaining).await?;

    let mut next_active = None;
    if stock_remaining == 0 {
        store.set_batch_active(batch.id, false).await?;

        if let Some(next) = store.oldest_batch_with_stock(inventory.id).await? {
            store.set_batch_active(next.id, true).await?;
            next_active = Some(next.id);
        }

        debug!(
            batch_id = %batch.id,
            next_active = ?next_active,
            "Batch exhausted"
        );
    }

    store
        .set_standard_stock(inventory.id, inventory.standard_stock - units)
        .await?;

    debug!(
        inventory_id = %inventory.id,
        batch_id = %batch.id,
        units,
        stock_remaining,
        "Allocated from batch"
    );

    Ok(BatchAllocation {
        batch_id: batch.id,
        cost_price: batch.cost_price(),
        units,
        stock_remaining,
        next_active,
        fabricated,
    })
}

/// Finds (or establishes) the FIFO head for an inventory row.
async fn head_batch(
    store: &mut dyn CheckoutStore,
    inventory: &Inventory,
    policy: MissingBatchPolicy,
) -> CoreResult<(Batch, bool)> {
    if let Some(batch) = store.active_batch(inventory.id).await? {
        return Ok((batch, false));
    }

    if let Some(mut batch) = store.oldest_batch_with_stock(inventory.id).await? {
        store.set_batch_active(batch.id, true).await?;
        batch.is_active_batch = true;
        debug!(batch_id = %batch.id, "Activated oldest batch with stock");
        return Ok((batch, false));
    }

    match policy {
        MissingBatchPolicy::Reject => Err(CoreError::NoBatchAvailable {
            inventory_id: inventory.id,
        }),
        MissingBatchPolicy::Fabricate => {
            let batch = Batch::received(
                inventory.id,
                Money::zero(),
                FABRICATED_BATCH_STOCK,
                FABRICATED_BATCH_SUPPLIER,
                true,
            );
            store.insert_batch(&batch).await?;

            warn!(
                inventory_id = %inventory.id,
                product_id = %inventory.product_id,
                batch_id = %batch.id,
                "No batch with stock; fabricated a zero-cost batch"
            );
            Ok((batch, true))
        }
    }
}
