//! Error and fault types.
//!
//! Two classes of failure exist:
//!
//! - [`ConfigError`]: returned by constructors when the configuration cannot
//!   drive the indexing engine (a zero tick size would divide by zero).
//! - [`BookFault`]: an internal invariant was violated. Faults are never
//!   returned to the caller; they are logged and raised as a panic, since the
//!   book can no longer guarantee that it serves correct data.
//!
//! Ordinary misses (key not present, slot already occupied) are reported as
//! `bool` / `Option` by the book operations themselves.

use thiserror::Error;

/// Configuration rejected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Tick size must be strictly positive
    #[error("tick size must be strictly positive")]
    InvalidTickSize,

    /// The fast book must hold at least one slot
    #[error("fast book size must be non-zero")]
    ZeroFastBookSize,
}

/// Unrecoverable invariant violation inside the book.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookFault {
    /// A layered slot is occupied for the side but holds a different key
    #[error("key mismatch at slot {index} tier {tier}: requested {requested}, stored {stored}")]
    KeyMismatch {
        /// Slot index
        index: usize,
        /// Tier number
        tier: usize,
        /// Key the caller asked for
        requested: String,
        /// Key found in the slot
        stored: String,
    },

    /// Two live entries landed on the same side/slot/tier while rehashing
    #[error("rehash around {reference} failed to place {side} entry {key}")]
    RehashCollision {
        /// New reference price
        reference: String,
        /// Side of the entry
        side: String,
        /// Key of the entry
        key: String,
    },

    /// The mid between best bid and best offer left the inline tier
    #[error("mid price {mid} moved outside the fast book around {reference}; rehash required")]
    ExcessiveDrift {
        /// Candidate mid price
        mid: String,
        /// Current reference price
        reference: String,
    },
}

impl BookFault {
    /// Log the fault and abort the current operation.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        tracing::error!(fault = %self, "order book invariant violated");
        panic!("{}", self)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
