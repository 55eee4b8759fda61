//! # Repository Module
//!
//! Database repository implementations for Garage POS.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-backed repositories            Executor functions                 │
//! │  ────────────────────────            ──────────────────                 │
//! │  db.transactions().get(id)           inventory::find_for_update(        │
//! │  db.batches().list_for(inv)              &mut *conn, product, location) │
//! │       │                                   │                             │
//! │       │ (autocommit, one                  │ (inside the checkout        │
//! │       │  statement each)                  │  transaction, row locks)    │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │      the same SQL, generic over `PgExecutor`                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LocationRepository`](location::LocationRepository) - Locations
//! - [`ProductRepository`](product::ProductRepository) - Products and categories
//! - [`InventoryRepository`](inventory::InventoryRepository) - Stock rows
//! - [`BatchRepository`](batch::BatchRepository) - FIFO cost batches
//! - [`BottleRepository`](bottle::BottleRepository) - Open lubricant bottles
//! - [`TransactionRepository`](transaction::TransactionRepository) - Sales and trade-ins

pub mod batch;
pub mod bottle;
pub mod inventory;
pub mod location;
pub mod product;
pub mod transaction;
