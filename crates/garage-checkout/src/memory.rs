//! # In-Memory Checkout Store
//!
//! A [`CheckoutStore`] over plain maps, for tests and local experiments.
//!
//! `begin` hands out a copy of the state; `commit` swaps it back in.
//! Dropping a [`MemoryTransaction`] is a rollback. The row constraints the
//! Postgres schema enforces (non-negative stock, one active batch per
//! inventory row, foreign keys, unique reference numbers) are checked on
//! every write and reported as [`CoreError::ConstraintViolation`].

use std::collections::HashMap;
use std::ops::Deref;

use async_trait::async_trait;
use uuid::Uuid;

use garage_core::{
    Batch, CoreError, CoreResult, Inventory, OpenBottle, Product, ProductSummary, TradeInRecord,
    Transaction, Volume,
};

use crate::store::CheckoutStore;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProductRow {
    name: String,
    category_id: Option<Uuid>,
    product_type: Option<String>,
}

/// Committed state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDatabase {
    locations: HashMap<Uuid, String>,
    categories: HashMap<Uuid, String>,
    products: HashMap<Uuid, ProductRow>,
    inventory: HashMap<Uuid, Inventory>,
    batches: HashMap<Uuid, Batch>,
    bottles: HashMap<Uuid, OpenBottle>,
    transactions: Vec<Transaction>,
    trade_ins: Vec<TradeInRecord>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    pub fn add_location(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.locations.insert(id, name.to_string());
        id
    }

    /// Adds a product, creating its category when needed.
    pub fn add_product(
        &mut self,
        name: &str,
        category: Option<&str>,
        product_type: Option<&str>,
    ) -> Uuid {
        let category_id = category.map(|c| self.category_id(c));
        let id = Uuid::new_v4();
        self.products.insert(
            id,
            ProductRow {
                name: name.to_string(),
                category_id,
                product_type: product_type.map(String::from),
            },
        );
        id
    }

    pub fn add_inventory(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
        standard_stock: i64,
        open_bottles: i64,
        closed_bottles: i64,
    ) -> Inventory {
        let inventory = Inventory {
            id: Uuid::new_v4(),
            product_id,
            location_id,
            standard_stock,
            open_bottles_stock: open_bottles,
            closed_bottles_stock: closed_bottles,
        };
        self.inventory.insert(inventory.id, inventory.clone());
        inventory
    }

    pub fn add_batch(&mut self, batch: Batch) {
        self.batches.insert(batch.id, batch);
    }

    pub fn add_open_bottle(&mut self, bottle: OpenBottle) {
        self.bottles.insert(bottle.id, bottle);
    }

    // =========================================================================
    // Unit of work
    // =========================================================================

    pub fn begin(&self) -> MemoryTransaction {
        MemoryTransaction {
            state: self.clone(),
        }
    }

    pub fn commit(&mut self, tx: MemoryTransaction) {
        *self = tx.state;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn summary(&self, product_id: Uuid) -> Option<ProductSummary> {
        self.products.get(&product_id).map(|row| ProductSummary {
            id: product_id,
            name: row.name.clone(),
            category: row
                .category_id
                .and_then(|id| self.categories.get(&id))
                .cloned(),
            product_type: row.product_type.clone(),
        })
    }

    /// Panics on an unknown id.
    pub fn inventory(&self, inventory_id: Uuid) -> Inventory {
        self.inventory[&inventory_id].clone()
    }

    /// Panics on an unknown id.
    pub fn batch(&self, batch_id: Uuid) -> Batch {
        self.batches[&batch_id].clone()
    }

    /// Panics on an unknown id.
    pub fn bottle(&self, bottle_id: Uuid) -> OpenBottle {
        self.bottles[&bottle_id].clone()
    }

    /// Panics on an unknown id.
    pub fn transaction(&self, transaction_id: Uuid) -> Transaction {
        self.transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .unwrap_or_else(|| panic!("no transaction {transaction_id}"))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn trade_ins_for(&self, transaction_id: Uuid) -> Vec<TradeInRecord> {
        self.trade_ins
            .iter()
            .filter(|r| r.transaction_id == transaction_id)
            .cloned()
            .collect()
    }

    /// Batches of an inventory row, oldest first.
    pub fn batches_for(&self, inventory_id: Uuid) -> Vec<Batch> {
        let mut batches: Vec<Batch> = self
            .batches
            .values()
            .filter(|b| b.inventory_id == inventory_id)
            .cloned()
            .collect();
        batches.sort_by_key(|b| (b.purchase_date, b.id));
        batches
    }

    pub fn active_batch_count(&self, inventory_id: Uuid) -> usize {
        self.batches
            .values()
            .filter(|b| b.inventory_id == inventory_id && b.is_active_batch)
            .count()
    }

    /// Bottles of an inventory row, oldest first.
    pub fn bottles_for(&self, inventory_id: Uuid) -> Vec<OpenBottle> {
        let mut bottles: Vec<OpenBottle> = self
            .bottles
            .values()
            .filter(|b| b.inventory_id == inventory_id)
            .cloned()
            .collect();
        bottles.sort_by_key(|b| (b.opened_at, b.id));
        bottles
    }

    fn category_id(&mut self, name: &str) -> Uuid {
        if let Some((id, _)) = self.categories.iter().find(|(_, n)| n.as_str() == name) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.categories.insert(id, name.to_string());
        id
    }
}

/// An open unit of work over a [`MemoryDatabase`] snapshot.
#[derive(Debug)]
pub struct MemoryTransaction {
    state: MemoryDatabase,
}

impl Deref for MemoryTransaction {
    type Target = MemoryDatabase;

    fn deref(&self) -> &MemoryDatabase {
        &self.state
    }
}

fn violation(message: impl Into<String>) -> CoreError {
    CoreError::ConstraintViolation(message.into())
}

fn non_negative(column: &str, value: i64) -> CoreResult<()> {
    if value < 0 {
        return Err(violation(format!("{column} must be >= 0, got {value}")));
    }
    Ok(())
}

impl MemoryTransaction {
    fn inventory_mut(&mut self, inventory_id: Uuid) -> CoreResult<&mut Inventory> {
        self.state
            .inventory
            .get_mut(&inventory_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Inventory".to_string(),
                id: inventory_id.to_string(),
            })
    }

    fn batch_mut(&mut self, batch_id: Uuid) -> CoreResult<&mut Batch> {
        self.state.batches.get_mut(&batch_id).ok_or_else(|| CoreError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        })
    }

    fn check_single_active(&self, inventory_id: Uuid) -> CoreResult<()> {
        if self.state.active_batch_count(inventory_id) > 1 {
            return Err(violation(format!(
                "more than one active batch for inventory {inventory_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for MemoryTransaction {
    async fn location_exists(&mut self, location_id: Uuid) -> CoreResult<bool> {
        Ok(self.state.locations.contains_key(&location_id))
    }

    async fn product_summaries(&mut self, product_ids: &[Uuid]) -> CoreResult<Vec<ProductSummary>> {
        Ok(product_ids
            .iter()
            .filter_map(|id| self.state.summary(*id))
            .collect())
    }

    async fn find_product_by_name(
        &mut self,
        name: &str,
        category: &str,
        product_type: &str,
    ) -> CoreResult<Option<Uuid>> {
        Ok(self
            .state
            .products
            .iter()
            .find(|(_, row)| {
                row.name == name
                    && row.product_type.as_deref() == Some(product_type)
                    && row
                        .category_id
                        .and_then(|id| self.state.categories.get(&id))
                        .is_some_and(|c| c == category)
            })
            .map(|(id, _)| *id))
    }

    async fn find_or_create_category(&mut self, name: &str) -> CoreResult<Uuid> {
        Ok(self.state.category_id(name))
    }

    async fn insert_product(&mut self, product: &Product) -> CoreResult<()> {
        if self.state.products.contains_key(&product.id) {
            return Err(violation(format!("duplicate product {}", product.id)));
        }
        if let Some(category_id) = product.category_id {
            if !self.state.categories.contains_key(&category_id) {
                return Err(violation(format!("unknown category {category_id}")));
            }
        }
        self.state.products.insert(
            product.id,
            ProductRow {
                name: product.name.clone(),
                category_id: product.category_id,
                product_type: product.product_type.clone(),
            },
        );
        Ok(())
    }

    async fn find_inventory(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> CoreResult<Option<Inventory>> {
        Ok(self
            .state
            .inventory
            .values()
            .find(|i| i.product_id == product_id && i.location_id == location_id)
            .cloned())
    }

    async fn insert_inventory(&mut self, inventory: &Inventory) -> CoreResult<()> {
        if !self.state.products.contains_key(&inventory.product_id) {
            return Err(violation(format!("unknown product {}", inventory.product_id)));
        }
        if !self.state.locations.contains_key(&inventory.location_id) {
            return Err(violation(format!("unknown location {}", inventory.location_id)));
        }
        let duplicate = self.state.inventory.values().any(|i| {
            i.product_id == inventory.product_id && i.location_id == inventory.location_id
        });
        if duplicate {
            return Err(violation("duplicate inventory row for product and location"));
        }
        non_negative("standard_stock", inventory.standard_stock)?;
        self.state.inventory.insert(inventory.id, inventory.clone());
        Ok(())
    }

    async fn set_standard_stock(&mut self, inventory_id: Uuid, standard_stock: i64) -> CoreResult<()> {
        non_negative("standard_stock", standard_stock)?;
        self.inventory_mut(inventory_id)?.standard_stock = standard_stock;
        Ok(())
    }

    async fn set_bottle_stock(
        &mut self,
        inventory_id: Uuid,
        open_bottles: i64,
        closed_bottles: i64,
    ) -> CoreResult<()> {
        non_negative("open_bottles_stock", open_bottles)?;
        non_negative("closed_bottles_stock", closed_bottles)?;
        let inventory = self.inventory_mut(inventory_id)?;
        inventory.open_bottles_stock = open_bottles;
        inventory.closed_bottles_stock = closed_bottles;
        Ok(())
    }

    async fn active_batch(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>> {
        Ok(self
            .state
            .batches_for(inventory_id)
            .into_iter()
            .find(|b| b.is_active_batch))
    }

    async fn oldest_batch_with_stock(&mut self, inventory_id: Uuid) -> CoreResult<Option<Batch>> {
        Ok(self
            .state
            .batches_for(inventory_id)
            .into_iter()
            .find(|b| b.stock_remaining > 0))
    }

    async fn insert_batch(&mut self, batch: &Batch) -> CoreResult<()> {
        if !self.state.inventory.contains_key(&batch.inventory_id) {
            return Err(violation(format!("unknown inventory {}", batch.inventory_id)));
        }
        non_negative("stock_remaining", batch.stock_remaining)?;
        self.state.batches.insert(batch.id, batch.clone());
        self.check_single_active(batch.inventory_id)
    }

    async fn set_batch_stock(&mut self, batch_id: Uuid, stock_remaining: i64) -> CoreResult<()> {
        non_negative("stock_remaining", stock_remaining)?;
        self.batch_mut(batch_id)?.stock_remaining = stock_remaining;
        Ok(())
    }

    async fn set_batch_active(&mut self, batch_id: Uuid, is_active: bool) -> CoreResult<()> {
        let batch = self.batch_mut(batch_id)?;
        batch.is_active_batch = is_active;
        let inventory_id = batch.inventory_id;
        self.check_single_active(inventory_id)
    }

    async fn oldest_open_bottle(&mut self, inventory_id: Uuid) -> CoreResult<Option<OpenBottle>> {
        Ok(self
            .state
            .bottles_for(inventory_id)
            .into_iter()
            .find(|b| !b.is_empty))
    }

    async fn insert_open_bottle(&mut self, bottle: &OpenBottle) -> CoreResult<()> {
        if !self.state.inventory.contains_key(&bottle.inventory_id) {
            return Err(violation(format!("unknown inventory {}", bottle.inventory_id)));
        }
        non_negative("current_volume", bottle.current_volume_ml)?;
        self.state.bottles.insert(bottle.id, bottle.clone());
        Ok(())
    }

    async fn update_open_bottle(
        &mut self,
        bottle_id: Uuid,
        current_volume: Volume,
        is_empty: bool,
    ) -> CoreResult<()> {
        non_negative("current_volume", current_volume.ml())?;
        let bottle = self
            .state
            .bottles
            .get_mut(&bottle_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "OpenBottle".to_string(),
                id: bottle_id.to_string(),
            })?;
        bottle.current_volume_ml = current_volume.ml();
        bottle.is_empty = is_empty;
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> CoreResult<()> {
        if !self.state.locations.contains_key(&transaction.location_id) {
            return Err(violation(format!("unknown location {}", transaction.location_id)));
        }
        let duplicate = self
            .state
            .transactions
            .iter()
            .any(|t| t.id == transaction.id || t.reference_number == transaction.reference_number);
        if duplicate {
            return Err(violation(format!(
                "duplicate transaction {}",
                transaction.reference_number
            )));
        }
        self.state.transactions.push(transaction.clone());
        Ok(())
    }

    async fn attach_receipt(
        &mut self,
        transaction_id: Uuid,
        receipt_html: Option<&str>,
        battery_bill_html: Option<&str>,
    ) -> CoreResult<()> {
        let transaction = self
            .state
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Transaction".to_string(),
                id: transaction_id.to_string(),
            })?;
        transaction.receipt_html = receipt_html.map(String::from);
        transaction.battery_bill_html = battery_bill_html.map(String::from);
        Ok(())
    }

    async fn insert_trade_in(&mut self, record: &TradeInRecord) -> CoreResult<()> {
        if !self.state.transactions.iter().any(|t| t.id == record.transaction_id) {
            return Err(violation(format!("unknown transaction {}", record.transaction_id)));
        }
        if !self.state.products.contains_key(&record.product_id) {
            return Err(violation(format!("unknown product {}", record.product_id)));
        }
        self.state.trade_ins.push(record.clone());
        Ok(())
    }
}
