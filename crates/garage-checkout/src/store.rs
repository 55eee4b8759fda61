//! # Checkout Store
//!
//! The unit-of-work port the engine writes through.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Database::checkout (garage-db)                                        │
//! │     │  BEGIN                                                            │
//! │     │                                                                   │
//! │     ├──► PgCheckoutStore ──► &mut dyn CheckoutStore ──► CheckoutEngine  │
//! │     │                                                                   │
//! │     │  Ok  → COMMIT                                                     │
//! │     │  Err → ROLLBACK                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An implementation is bound to one open transaction. The engine never
//! commits or rolls back; whoever created the store does, exactly once.
//!
//! Reads that precede a write to the same row (`find_inventory`,
//! `active_batch`, `oldest_batch_with_stock`, `oldest_open_bottle`) must
//! lock that row until the transaction ends.

use async_trait::async_trait;
use uuid::Uuid;

use garage_core::{
    Batch, CoreResult, Inventory, OpenBottle, Product, ProductSummary, TradeInRecord, Transaction,
    Volume,
};

#[async_trait]
pub trait CheckoutStore: Send {
    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    async fn location_exists(&mut self, location_id: Uuid) -> CoreResult<bool>;

    /// Summaries for the ids that exist. Unknown ids are left out.
    async fn product_summaries(&mut self, product_ids: &[Uuid]) -> CoreResult<Vec<ProductSummary>>;

    /// Product id by exact name within a category and product type.
    async fn find_product_by_name(
        &mut self,
        name: &str,
        category: &str,
        product_type: &str,
    ) -> CoreResult<Option<Uuid>>;

    async fn find_or_create_category(&mut self, name: &str) -> CoreResult<Uuid>;

    async fn insert_product(&mut self, product: &Product) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------

    /// The inventory row for a product at a location, locked.
    async fn find_inventory(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> CoreResult<Option<Inventory>>;

    async fn insert_inventory(&mut self, inventory: &Inventory) -> CoreResult<()>;

    async fn set_standard_stock(&mut self, inventory_id: Uuid, standard_stock: i64) -> CoreResult<()>;

    async fn set_bottle_stock(
        &mut self,
        inventory_id: Uuid,
        open_bottles: i64,
        closed_bottles: i64,
    ) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Batches
    // -------------------------------------------------------------------------

    /// The active batch, oldest purchase date first if several are flagged.
    async fn active_batch(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>>;

    /// The oldest batch with `stock_remaining > 0`.
    async fn oldest_batch_with_stock(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>>;

    async fn insert_batch(&mut self, batch: &Batch) -> CoreResult<()>;

    async fn set_batch_stock(&mut self, batch_id: Uuid, stock_remaining: i64) -> CoreResult<()>;

    async fn set_batch_active(&mut self, batch_id: Uuid, is_active: bool) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Open bottles
    // -------------------------------------------------------------------------

    /// The oldest bottle that is not empty, by `opened_at`.
    async fn oldest_open_bottle(&mut self, inventory_id: Uuid) -> CoreResult<Option<OpenBottle>>;

    async fn insert_open_bottle(&mut self, bottle: &OpenBottle) -> CoreResult<()>;

    async fn update_open_bottle(
        &mut self,
        bottle_id: Uuid,
        current_volume: Volume,
        is_empty: bool,
    ) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Inserts the transaction without its rendered document.
    async fn insert_transaction(&mut self, transaction: &Transaction) -> CoreResult<()>;

    async fn attach_receipt(
        &mut self,
        transaction_id: Uuid,
        receipt_html: Option<&str>,
        battery_bill_html: Option<&str>,
    ) -> CoreResult<()>;

    async fn insert_trade_in(&mut self, record: &TradeInRecord) -> CoreResult<()>;
}
