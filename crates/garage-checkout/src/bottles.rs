//! # Lubricant Bottle Ledger
//!
//! Lubricants are stocked as sealed (closed) bottles and partially used
//! (open) bottles instead of standard units. The cart line says which pool
//! to pour from.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLOSED                                  OPEN                           │
//! │  ──────                                  ────                           │
//! │  closed ≥ 1 ?  else NoClosedBottles      oldest non-empty bottle ?      │
//! │  closed −= 1                               else NoOpenBottles           │
//! │  left = size − sold                      current ≥ sold ?               │
//! │  left > 0 : new open bottle, open += 1     else InsufficientBottleVolume│
//! │  left ≤ 0 : bottle recorded empty,       current −= sold                │
//! │             open unchanged               current ≤ 0 : empty, open −= 1 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Standard stock and batches are never touched for a lubricant line.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use garage_core::{BottleSource, CoreError, CoreResult, Inventory, OpenBottle, Volume};

use crate::store::CheckoutStore;

/// Result of one lubricant line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleMovement {
    pub bottle_id: Uuid,
    pub source: BottleSource,
    pub poured: Volume,
    /// Volume left in the bottle afterwards (never negative).
    pub remaining: Volume,
    pub emptied: bool,
}

/// Pours `volume` from the pool named by `source`.
///
/// `bottle_size` is only used when a sealed bottle is opened.
pub async fn pour(
    store: &mut dyn CheckoutStore,
    inventory: &Inventory,
    source: BottleSource,
    volume: Volume,
    bottle_size: Volume,
) -> CoreResult<BottleMovement> {
    match source {
        BottleSource::Closed => open_sealed_bottle(store, inventory, volume, bottle_size).await,
        BottleSource::Open => pour_from_open_bottle(store, inventory, volume).await,
    }
}

async fn open_sealed_bottle(
    store: &mut dyn CheckoutStore,
    inventory: &Inventory,
    volume: Volume,
    bottle_size: Volume,
) -> CoreResult<BottleMovement> {
    if inventory.closed_bottles_stock < 1 {
        return Err(CoreError::NoClosedBottles {
            product_id: inventory.product_id,
        });
    }

    let left = bottle_size - volume;
    let emptied = left.is_exhausted();
    let remaining = left.clamp_to_zero();

    let bottle = OpenBottle {
        id: Uuid::new_v4(),
        inventory_id: inventory.id,
        initial_volume_ml: bottle_size.ml(),
        current_volume_ml: remaining.ml(),
        opened_at: Utc::now(),
        is_empty: emptied,
    };
    store.insert_open_bottle(&bottle).await?;

    // A bottle emptied by the sale that opened it never joins the open pool.
    let open_bottles = if emptied {
        inventory.open_bottles_stock
    } else {
        inventory.open_bottles_stock + 1
    };
    store
        .set_bottle_stock(inventory.id, open_bottles, inventory.closed_bottles_stock - 1)
        .await?;

    debug!(
        inventory_id = %inventory.id,
        bottle_id = %bottle.id,
        size = %bottle_size,
        poured = %volume,
        remaining = %remaining,
        emptied,
        "Opened sealed bottle"
    );

    Ok(BottleMovement {
        bottle_id: bottle.id,
        source: BottleSource::Closed,
        poured: volume,
        remaining,
        emptied,
    })
}

async fn pour_from_open_bottle(
    store: &mut dyn CheckoutStore,
    inventory: &Inventory,
    volume: Volume,
) -> CoreResult<BottleMovement> {
    let bottle = store
        .oldest_open_bottle(inventory.id)
        .await?
        .ok_or(CoreError::NoOpenBottles {
            product_id: inventory.product_id,
        })?;

    let current = bottle.current_volume();
    if current < volume {
        return Err(CoreError::InsufficientBottleVolume {
            bottle_id: bottle.id,
            available: current,
            required: volume,
        });
    }

    let left = current - volume;
    let emptied = left.is_exhausted();
    let remaining = left.clamp_to_zero();
    store
        .update_open_bottle(bottle.id, remaining, emptied)
        .await?;

    if emptied {
        let open_bottles = if inventory.open_bottles_stock > 0 {
            inventory.open_bottles_stock - 1
        } else {
            warn!(
                inventory_id = %inventory.id,
                bottle_id = %bottle.id,
                "Open bottle emptied while open_bottles_stock is already 0"
            );
            0
        };
        store
            .set_bottle_stock(inventory.id, open_bottles, inventory.closed_bottles_stock)
            .await?;
    }

    debug!(
        inventory_id = %inventory.id,
        bottle_id = %bottle.id,
        poured = %volume,
        remaining = %remaining,
        emptied,
        "Poured from open bottle"
    );

    Ok(BottleMovement {
        bottle_id: bottle.id,
        source: BottleSource::Open,
        poured: volume,
        remaining,
        emptied,
    })
}
