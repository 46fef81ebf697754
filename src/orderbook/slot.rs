//! Slot: one entry of the primary array.
//!
//! ## Design
//!
//! Each slot owns three containers, one per storage tier:
//!
//! ```text
//! Slot {
//!     inline:   PriceLevelNode            tier 0
//!     fixed:    Box<[PriceLevelNode; N]>  tiers 1..=N
//!     overflow: Vec<OverflowEntry>        tiers > N, tagged
//! }
//! ```
//!
//! - The inline node sits in the primary array itself, so the fast book
//!   is served without chasing a pointer
//! - The fixed array is allocated once and never resized
//! - The overflow list grows and shrinks with inserts and erases
//!
//! Nothing in a slot is shared. A rehash moves entries out of old slots
//! into freshly built ones.

use std::mem;

use crate::orderbook::index::Tier;
use crate::orderbook::node::{OverflowEntry, PriceLevelNode};
use crate::types::Side;

/// One position of the primary array with its collision storage.
#[derive(Debug, Clone)]
pub struct Slot<K, V> {
    inline: PriceLevelNode<K, V>,
    fixed: Box<[PriceLevelNode<K, V>]>,
    overflow: Vec<OverflowEntry<K, V>>,
}

impl<K, V> Slot<K, V> {
    /// Create an empty slot with `collision_tier_count` fixed nodes
    pub fn new(collision_tier_count: usize) -> Self {
        Self {
            inline: PriceLevelNode::new(),
            fixed: (0..collision_tier_count)
                .map(|_| PriceLevelNode::new())
                .collect(),
            overflow: Vec::new(),
        }
    }

    /// The inline node (tier 0)
    #[inline]
    pub fn inline(&self) -> &PriceLevelNode<K, V> {
        &self.inline
    }

    /// The fixed collision nodes (tiers `1..=N`)
    #[inline]
    pub fn fixed(&self) -> &[PriceLevelNode<K, V>] {
        &self.fixed
    }

    /// The overflow entries, in storage order
    #[inline]
    pub fn overflow(&self) -> &[OverflowEntry<K, V>] {
        &self.overflow
    }

    /// Node for a layered tier. `None` for overflow tiers.
    #[inline]
    pub fn layer(&self, tier: Tier) -> Option<&PriceLevelNode<K, V>> {
        match tier {
            Tier::Inline => Some(&self.inline),
            Tier::Fixed(i) => self.fixed.get(i),
            Tier::Overflow(_) => None,
        }
    }

    #[inline]
    pub(crate) fn layer_mut(&mut self, tier: Tier) -> Option<&mut PriceLevelNode<K, V>> {
        match tier {
            Tier::Inline => Some(&mut self.inline),
            Tier::Fixed(i) => self.fixed.get_mut(i),
            Tier::Overflow(_) => None,
        }
    }

    #[inline]
    pub(crate) fn overflow_node_mut(&mut self, entry: usize) -> Option<&mut PriceLevelNode<K, V>> {
        self.overflow.get_mut(entry).map(|e| &mut e.node)
    }

    /// Remove `side` from the overflow entry at `entry`, dropping the entry
    /// once both of its sides are vacant.
    pub(crate) fn take_overflow(&mut self, entry: usize, side: Side) -> Option<(K, V)> {
        let node = &mut self.overflow.get_mut(entry)?.node;
        let removed = node.take(side);
        if node.is_empty() {
            self.overflow.remove(entry);
        }
        removed
    }

    /// Number of live `(side, key)` pairs across all tiers of this slot
    pub fn len(&self) -> usize {
        self.inline.occupied_count()
            + self.fixed.iter().map(PriceLevelNode::occupied_count).sum::<usize>()
            + self.overflow.iter().map(|e| e.node.occupied_count()).sum::<usize>()
    }

    /// Whether no tier holds an entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by this slot: container headers, fixed nodes and live
    /// overflow entries.
    pub fn byte_size(&self) -> usize {
        mem::size_of::<PriceLevelNode<K, V>>()
            + mem::size_of::<Box<[PriceLevelNode<K, V>]>>()
            + mem::size_of::<Vec<OverflowEntry<K, V>>>()
            + self.fixed.len() * mem::size_of::<PriceLevelNode<K, V>>()
            + self.overflow.len() * mem::size_of::<OverflowEntry<K, V>>()
    }

    /// Drop every entry while keeping the fixed array allocated
    pub(crate) fn clear(&mut self) {
        self.inline.clear();
        for node in self.fixed.iter_mut() {
            node.clear();
        }
        self.overflow.clear();
    }

    /// Move all entries out: inline, then each fixed node, then each overflow
    /// entry, bid before ask within a node.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (Side, K, V)> {
        std::iter::once(self.inline)
            .chain(self.fixed.into_vec())
            .chain(self.overflow.into_iter().map(|e| e.node))
            .flat_map(PriceLevelNode::into_entries)
    }
}

impl<K: PartialEq, V> Slot<K, V> {
    /// Position in the overflow list of the entry holding `key` on `side`.
    pub fn find_overflow(&self, side: Side, key: &K) -> Option<usize> {
        self.overflow
            .iter()
            .position(|e| e.node.key(side) == Some(key))
    }

    /// Insert into the overflow tier.
    ///
    /// Fails if `key` is already present on `side`. Otherwise the entry fills
    /// the vacant side of an existing node at the same tier, or a new node is
    /// appended.
    pub(crate) fn insert_overflow(
        &mut self,
        side: Side,
        key: K,
        value: V,
        tier: usize,
    ) -> Result<(), (K, V)> {
        if self.find_overflow(side, &key).is_some() {
            return Err((key, value));
        }

        match self
            .overflow
            .iter_mut()
            .find(|e| e.tier == tier && !e.node.is_occupied(side))
        {
            Some(entry) => entry.node.try_set(side, key, value),
            None => {
                self.overflow.push(OverflowEntry::new(side, key, value, tier));
                Ok(())
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
