//! # Hash Order Book
//!
//! Price-indexed order book storage with constant-time insert, lookup and
//! erase for prices near a reference mid price.
//!
//! ## Architecture
//!
//! The crate consists of:
//! - **Types**: Core value types (Side, PriceKey)
//! - **Config**: Book shape (tick size, fast book size, collision tiers)
//! - **OrderBook**: Slot array, indexing engine, cursors
//! - **Error**: Configuration errors and fatal invariant faults
//!
//! ## Design Principles
//!
//! 1. **No ordered structure**: placement is computed from the tick offset
//!    to the reference price, never by searching
//! 2. **Pre-allocated memory**: the slot array and fixed collision tiers are
//!    allocated once; only overflow grows
//! 3. **Single-threaded**: no internal locking, callers synchronise
//! 4. **Loud failures**: broken invariants panic instead of returning wrong data
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (rehash and clear at `debug`,
//! overflow placement at `trace`, faults at `error`) and never installs a
//! subscriber.

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Side, PriceKey
pub mod types;

/// Book configuration
pub mod config;

/// Configuration errors and fatal faults
pub mod error;

/// Order book: slots, indexing, cursors
pub mod orderbook;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::BookConfig;
pub use error::{BookFault, ConfigError};
pub use orderbook::{Cursor, HashOrderBook, Levels, Location, PriceLevelNode, Tier};
pub use types::{PriceKey, Side};
