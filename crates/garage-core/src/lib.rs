//! # garage-core: Pure Business Logic for Garage POS
//!
//! This crate is the domain layer of the checkout service. Every function in
//! it is deterministic apart from the clock and id generation, and none of
//! them touch the database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Garage POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web client (out of scope)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ POST /checkout                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    checkout-api (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ garage-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────┐         │   │
//! │  │   │  types   │ │  money   │ │ validation│ │ receipt  │         │   │
//! │  │   │ Batch    │ │ Money    │ │ checkout  │ │ thermal  │         │   │
//! │  │   │ Bottle   │ │ Quantity │ │ request   │ │ battery  │         │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        garage-checkout (engine)  ──►  garage-db (PostgreSQL)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Inventory, Batch, OpenBottle, Transaction, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Sale quantities and bottle volumes
//! - [`catalog`] - Product metadata and battery/lubricant classification
//! - [`validation`] - Checkout request parsing and validation
//! - [`pricing`] - Totals, transaction typing, reference numbers
//! - [`receipt`] - Receipt and battery bill rendering
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use garage_core::money::Money;
//! use garage_core::quantity::Quantity;
//!
//! // 3 decimal places: 10.500 OMR
//! let price = Money::from_minor(10_500);
//! let line = price.times(Quantity::from_units(2));
//!
//! assert_eq!(line.minor(), 21_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{ProductCatalog, ProductSummary};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use quantity::{Quantity, Volume};
pub use receipt::{HtmlReceiptRenderer, ReceiptData, ReceiptRenderer};
pub use types::*;
pub use validation::{parse_checkout_request, CheckoutRequest};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Product id the till sends for labour and service charges.
///
/// Lines carrying it never touch inventory. It is recognised once, during
/// validation, and becomes [`LineItemKind::ServiceCharge`].
pub const SERVICE_CHARGE_PRODUCT_ID: &str = "9999";

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Largest quantity accepted on one line, in whole units.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest price or trade-in value accepted, in major units.
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_CART_ITEMS`] this keeps every cart
/// total inside the `i64` minor-unit range.
pub const MAX_AMOUNT: i64 = 10_000_000;

/// Bottle size assumed when a lubricant line has no readable volume.
pub const DEFAULT_BOTTLE_SIZE: Volume = Volume::from_ml(4_000);

/// Units put on a batch fabricated for an inventory row that has none.
pub const FABRICATED_BATCH_STOCK: i64 = 1_000;

/// Supplier recorded on fabricated batches.
pub const FABRICATED_BATCH_SUPPLIER: &str = "System Generated";

/// Supplier recorded on batches created from battery trade-ins.
pub const TRADE_IN_BATCH_SUPPLIER: &str = "Trade-in";
