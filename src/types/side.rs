//! Book side for price levels.
//!
//! Every stored entry belongs to exactly one side. A single node can carry
//! one bid entry and one ask entry at the same time, so the side is the
//! occupancy key inside a node, not a property of the node.

use std::fmt;

// ============================================================================
// Side enum
// ============================================================================

/// Book side: Bid or Ask
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Side {
    /// Resting buy interest. Better prices are higher.
    #[default]
    Bid,
    /// Resting sell interest. Better prices are lower.
    Ask,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Whether `candidate` is a strictly better price than `current` on this side.
    ///
    /// Bids improve upwards, asks improve downwards.
    #[inline]
    pub fn improves<K: Ord>(self, candidate: &K, current: &K) -> bool {
        match self {
            Side::Bid => candidate > current,
            Side::Ask => candidate < current,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("BID"),
            Side::Ask => f.write_str("ASK"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
