//! # garage-db: Database Layer for Garage POS
//!
//! PostgreSQL access for the checkout service, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Garage POS Data Flow                             │
//! │                                                                         │
//! │  POST /checkout (checkout-api)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     garage-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ inventory.rs  │    │  (embedded)  │   │   │
//! │  │   │               │    │ batch.rs      │    │              │   │   │
//! │  │   │ PgPool        │◄───│ bottle.rs     │    │ 0001_initial │   │   │
//! │  │   │ checkout()    │    │ transaction.rs│    │ _schema.sql  │   │   │
//! │  │   └───────┬───────┘    └───────▲───────┘    └──────────────┘   │   │
//! │  │           │ BEGIN              │                                │   │
//! │  │           ▼                    │                                │   │
//! │  │   PgCheckoutStore (store.rs) ──┘  ◄── CheckoutEngine            │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, health probe, checkout transaction boundary
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL per table
//! - [`store`] - The engine's `CheckoutStore` over one PostgreSQL transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use garage_db::{Database, DbConfig};
//!
//! let db = Database::connect(DbConfig::new(database_url)).await?;
//! db.health_check().await?;
//! let outcome = db.checkout(&engine, &input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::PgCheckoutStore;

pub use repository::batch::BatchRepository;
pub use repository::bottle::BottleRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::location::LocationRepository;
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
