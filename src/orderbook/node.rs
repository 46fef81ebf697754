//! Price level node: one optional entry per side.
//!
//! ## Design
//!
//! A node is the unit of storage at every tier. It holds at most one bid
//! entry and at most one ask entry, each an optional `(price, quantity)`
//! pair. Both can be present at once, and in the overflow tier the two
//! prices need not match, so occupancy is tracked per side rather than by a
//! shared key.
//!
//! ## Memory Layout
//!
//! ```text
//! PriceLevelNode {
//!     bid: Option<(K, V)>
//!     ask: Option<(K, V)>
//! }
//! ```

use crate::types::Side;

/// Storage node holding up to one entry per side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevelNode<K, V> {
    bid: Option<(K, V)>,
    ask: Option<(K, V)>,
}

impl<K, V> Default for PriceLevelNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PriceLevelNode<K, V> {
    /// Create an empty node
    #[inline]
    pub const fn new() -> Self {
        Self {
            bid: None,
            ask: None,
        }
    }

    /// Create a node with a single entry on `side`
    ///
    /// # Example
    ///
    /// ```
    /// use hash_orderbook::orderbook::PriceLevelNode;
    /// use hash_orderbook::Side;
    ///
    /// let node = PriceLevelNode::with_entry(Side::Bid, 100u64, 5u64);
    ///
    /// assert_eq!(node.entry(Side::Bid), Some((&100, &5)));
    /// assert!(!node.is_occupied(Side::Ask));
    /// ```
    pub fn with_entry(side: Side, key: K, value: V) -> Self {
        let mut node = Self::new();
        *node.slot_mut(side) = Some((key, value));
        node
    }

    #[inline]
    fn slot(&self, side: Side) -> &Option<(K, V)> {
        match side {
            Side::Bid => &self.bid,
            Side::Ask => &self.ask,
        }
    }

    #[inline]
    fn slot_mut(&mut self, side: Side) -> &mut Option<(K, V)> {
        match side {
            Side::Bid => &mut self.bid,
            Side::Ask => &mut self.ask,
        }
    }

    /// Whether `side` holds an entry
    #[inline]
    pub fn is_occupied(&self, side: Side) -> bool {
        self.slot(side).is_some()
    }

    /// Whether neither side holds an entry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bid.is_none() && self.ask.is_none()
    }

    /// Number of occupied sides (0, 1 or 2)
    #[inline]
    pub fn occupied_count(&self) -> usize {
        self.bid.is_some() as usize + self.ask.is_some() as usize
    }

    /// The `(price, quantity)` entry for `side`
    #[inline]
    pub fn entry(&self, side: Side) -> Option<(&K, &V)> {
        self.slot(side).as_ref().map(|(k, v)| (k, v))
    }

    /// The price stored for `side`
    #[inline]
    pub fn key(&self, side: Side) -> Option<&K> {
        self.slot(side).as_ref().map(|(k, _)| k)
    }

    /// The quantity stored for `side`
    #[inline]
    pub fn value(&self, side: Side) -> Option<&V> {
        self.slot(side).as_ref().map(|(_, v)| v)
    }

    /// Mutable quantity for `side`. The price cannot be changed in place,
    /// since it determines where the node lives.
    #[inline]
    pub fn value_mut(&mut self, side: Side) -> Option<&mut V> {
        self.slot_mut(side).as_mut().map(|(_, v)| v)
    }

    /// Bid entry, if any
    #[inline]
    pub fn bid(&self) -> Option<(&K, &V)> {
        self.entry(Side::Bid)
    }

    /// Ask entry, if any
    #[inline]
    pub fn ask(&self) -> Option<(&K, &V)> {
        self.entry(Side::Ask)
    }

    /// Store an entry on a vacant side, handing it back if the side is taken.
    pub(crate) fn try_set(&mut self, side: Side, key: K, value: V) -> Result<(), (K, V)> {
        let slot = self.slot_mut(side);
        if slot.is_some() {
            return Err((key, value));
        }
        *slot = Some((key, value));
        Ok(())
    }

    /// Remove and return the entry for `side`
    #[inline]
    pub(crate) fn take(&mut self, side: Side) -> Option<(K, V)> {
        self.slot_mut(side).take()
    }

    /// Drop both entries
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.bid = None;
        self.ask = None;
    }

    /// Move both entries out, bid first
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (Side, K, V)> {
        let bid = self.bid.map(|(k, v)| (Side::Bid, k, v));
        let ask = self.ask.map(|(k, v)| (Side::Ask, k, v));
        bid.into_iter().chain(ask)
    }
}

/// Overflow-tier node tagged with the tier it was placed at.
///
/// The tier is stored so traversal never needs to recompute it from the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverflowEntry<K, V> {
    /// The stored entries
    pub node: PriceLevelNode<K, V>,
    /// Tier number at placement time (always above the fixed tiers)
    pub tier: usize,
}

impl<K, V> OverflowEntry<K, V> {
    /// Create an overflow entry holding a single side
    #[inline]
    pub fn new(side: Side, key: K, value: V, tier: usize) -> Self {
        Self {
            node: PriceLevelNode::with_entry(side, key, value),
            tier,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_new() {
        let node: PriceLevelNode<u64, u64> = PriceLevelNode::new();

        assert!(node.is_empty());
        assert_eq!(node.occupied_count(), 0);
        assert!(node.bid().is_none());
        assert!(node.ask().is_none());
    }

    #[test]
    fn test_node_both_sides() {
        let mut node = PriceLevelNode::new();

        assert!(node.try_set(Side::Bid, 110u64, 5u64).is_ok());
        assert!(node.try_set(Side::Ask, 111u64, 7u64).is_ok());

        assert_eq!(node.occupied_count(), 2);
        assert_eq!(node.bid(), Some((&110, &5)));
        assert_eq!(node.ask(), Some((&111, &7)));
        assert_eq!(node.key(Side::Ask), Some(&111));
        assert_eq!(node.value(Side::Bid), Some(&5));
    }

    #[test]
    fn test_node_no_overwrite() {
        let mut node = PriceLevelNode::with_entry(Side::Bid, 110u64, 5u64);

        assert_eq!(node.try_set(Side::Bid, 110, 9), Err((110, 9)));
        assert_eq!(node.value(Side::Bid), Some(&5));
    }

    #[test]
    fn test_node_take_and_clear() {
        let mut node = PriceLevelNode::with_entry(Side::Ask, 120u64, 1u64);
        node.try_set(Side::Bid, 100, 2).unwrap();

        assert_eq!(node.take(Side::Ask), Some((120, 1)));
        assert!(node.take(Side::Ask).is_none());
        assert!(!node.is_empty());

        node.clear();
        assert!(node.is_empty());
    }

    #[test]
    fn test_node_value_mut() {
        let mut node = PriceLevelNode::with_entry(Side::Bid, 100u64, 1u64);

        if let Some(qty) = node.value_mut(Side::Bid) {
            *qty += 4;
        }
        assert_eq!(node.value(Side::Bid), Some(&5));
        assert!(node.value_mut(Side::Ask).is_none());
    }

    #[test]
    fn test_node_into_entries_order() {
        let mut node = PriceLevelNode::with_entry(Side::Ask, 120u64, 1u64);
        node.try_set(Side::Bid, 100, 2).unwrap();

        let entries: Vec<_> = node.into_entries().collect();
        assert_eq!(entries, vec![(Side::Bid, 100, 2), (Side::Ask, 120, 1)]);
    }

    #[test]
    fn test_overflow_entry_new() {
        let entry = OverflowEntry::new(Side::Ask, 150u64, 3u64, 5);

        assert_eq!(entry.tier, 5);
        assert_eq!(entry.node.ask(), Some((&150, &3)));
        assert!(!entry.node.is_occupied(Side::Bid));
    }
}
