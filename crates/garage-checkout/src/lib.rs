//! # garage-checkout: Checkout Transaction Engine
//!
//! Applies one validated [`CheckoutInput`](garage_core::CheckoutInput) to
//! inventory and records the resulting transaction.
//!
//! ## Module Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          garage-checkout                                │
//! │                                                                         │
//! │   engine ─────────┬──────────────┬──────────────┐                       │
//! │     │             │              │              │                       │
//! │     ▼             ▼              ▼              ▼                       │
//! │   fifo         bottles        trade_in       receipt (garage-core)      │
//! │   batches      open/closed    restock                                   │
//! │     │             │              │                                      │
//! │     └─────────────┴──────┬───────┘                                      │
//! │                          ▼                                              │
//! │                 store::CheckoutStore  (one open DB transaction)         │
//! │                    │               │                                    │
//! │                    ▼               ▼                                    │
//! │           PgCheckoutStore     memory::MemoryTransaction                 │
//! │             (garage-db)        (tests / `memory` feature)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bottles;
pub mod engine;
pub mod fifo;
pub mod store;
pub mod trade_in;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use bottles::BottleMovement;
pub use engine::{CheckoutEngine, CheckoutOutcome, CheckoutPolicy, LineEffect};
pub use fifo::{BatchAllocation, MissingBatchPolicy};
pub use store::CheckoutStore;
pub use trade_in::TradeInRestock;
