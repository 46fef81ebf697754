//! Hash order book: price-indexed storage of price levels.
//!
//! ## Architecture
//!
//! The book maps `(side, price)` to a quantity without any ordered
//! structure:
//!
//! - **Indexing**: a price's tick offset from the reference mid price picks a
//!   slot index and a tier (see [`Indexer`])
//! - **Slots**: a fixed array of [`Slot`]s, each with an inline node, a fixed
//!   collision array and an overflow list
//! - **BBO tracking**: best bid, best offer and the slot of their mid price
//!   are cached on insert
//!
//! ## Complexity
//!
//! | Operation          | Complexity                                   |
//! |--------------------|----------------------------------------------|
//! | insert/find/erase  | O(1) in inline/fixed tiers, O(k) in overflow |
//! | best bid/offer     | O(1)                                         |
//! | rehash             | O(size x (1 + tiers) + overflow entries)     |
//!
//! ## Stale BBO
//!
//! Erasing the cached best bid or best offer does not search for the next
//! best price. The cached key keeps pointing at the erased level until an
//! insert on that side improves on it, so [`HashOrderBook::best_bid_price`]
//! can report a price that [`HashOrderBook::get_best_bid`] no longer finds.
//!
//! ## Example
//!
//! ```
//! use hash_orderbook::{BookConfig, HashOrderBook, Side};
//!
//! let mut book = HashOrderBook::new(BookConfig::new(1u64, 10, 3), 110).unwrap();
//!
//! assert!(book.insert(Side::Bid, 109, 5));
//! assert!(book.insert(Side::Ask, 111, 7));
//!
//! assert_eq!(book.get_best_bid(), Some((109, &5)));
//! assert_eq!(book.get_best_offer(), Some((111, &7)));
//! assert_eq!(book.find(Side::Ask, 111), Some(&7));
//! assert_eq!(book.len(), 2);
//! ```

use std::mem;

use tracing::{debug, trace};

use crate::config::BookConfig;
use crate::error::{BookFault, ConfigError};
use crate::orderbook::cursor::{Cursor, Levels};
use crate::orderbook::index::{Indexer, Location, Tier};
use crate::orderbook::node::PriceLevelNode;
use crate::orderbook::slot::Slot;
use crate::types::{PriceKey, Side};

/// Where a live `(side, key)` pair is stored.
#[derive(Debug, Clone, Copy)]
enum Resolved {
    Layer(usize, Tier),
    Overflow(usize, usize),
}

/// Price-indexed order book storage.
///
/// Single-threaded: callers that share a book across threads must wrap it
/// in their own lock.
#[derive(Debug, Clone)]
pub struct HashOrderBook<K, V> {
    /// Price to slot mapping
    indexer: Indexer<K>,

    /// Primary array, `fast_book_size` long
    slots: Vec<Slot<K, V>>,

    /// Reference price the indexer centres on
    reference_mid: K,

    /// Cached best bid (highest inserted, not rescanned on erase)
    best_bid: Option<K>,

    /// Cached best offer (lowest inserted, not rescanned on erase)
    best_offer: Option<K>,

    /// Slot index of the current mid price
    mid_index: usize,

    /// Live `(side, key)` pairs
    len: usize,
}

impl<K: PriceKey, V> HashOrderBook<K, V> {
    /// Create an empty book centred on `reference_mid`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the tick size is not strictly positive
    /// or the fast book size is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use hash_orderbook::{BookConfig, ConfigError, HashOrderBook};
    ///
    /// let book: HashOrderBook<u64, u64> =
    ///     HashOrderBook::new(BookConfig::new(1, 10, 3), 110).unwrap();
    /// assert!(book.is_empty());
    ///
    /// let err = HashOrderBook::<u64, u64>::new(BookConfig::new(0, 10, 3), 110).unwrap_err();
    /// assert_eq!(err, ConfigError::InvalidTickSize);
    /// ```
    pub fn new(config: BookConfig<K>, reference_mid: K) -> Result<Self, ConfigError> {
        let indexer = Indexer::new(config)?;
        Ok(Self {
            slots: Self::allocate_slots(&indexer),
            mid_index: indexer.centre(),
            indexer,
            reference_mid,
            best_bid: None,
            best_offer: None,
            len: 0,
        })
    }

    fn allocate_slots(indexer: &Indexer<K>) -> Vec<Slot<K, V>> {
        let config = indexer.config();
        (0..config.fast_book_size)
            .map(|_| Slot::new(config.collision_tier_count))
            .collect()
    }

    // ========================================================================
    // Size and Configuration
    // ========================================================================

    /// Number of live `(side, price)` entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Alias of [`HashOrderBook::len`]
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Check if the book holds no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Configuration the book was built with
    #[inline]
    pub fn config(&self) -> &BookConfig<K> {
        self.indexer.config()
    }

    /// Reference price used for indexing
    #[inline]
    pub fn reference_mid(&self) -> K {
        self.reference_mid
    }

    /// Slot index currently cached as the mid slot
    #[inline]
    pub fn mid_index(&self) -> usize {
        self.mid_index
    }

    /// The slots of the primary array
    #[inline]
    pub fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    #[inline]
    pub(crate) fn indexer(&self) -> &Indexer<K> {
        &self.indexer
    }

    /// Locate `key` around the current reference price
    #[inline]
    pub fn locate(&self, side: Side, key: K) -> Location {
        self.indexer.locate(side, key, self.reference_mid)
    }

    /// Bytes held by the slot array: inline nodes, fixed tiers and live
    /// overflow entries. Diagnostic only.
    pub fn byte_size(&self) -> usize {
        self.slots.iter().map(Slot::byte_size).sum()
    }

    // ========================================================================
    // Insert / Find / Erase
    // ========================================================================

    /// Insert `value` at `key` on `side`.
    ///
    /// Returns `false` if the position for `side` is already occupied; an
    /// existing entry is never overwritten, erase it first to replace it.
    ///
    /// # Panics
    ///
    /// Panics if the insert moves the mid between best bid and best offer
    /// out of the inline tier. The book must be rehashed before that point.
    pub fn insert(&mut self, side: Side, key: K, value: V) -> bool {
        let location = self.locate(side, key);
        if place(&mut self.slots, location, side, key, value).is_err() {
            return false;
        }

        if let Tier::Overflow(tier) = location.tier {
            trace!(%side, ?key, index = location.index, tier, "entry placed in overflow tier");
        }

        self.len += 1;
        self.update_bbo_and_mid(side, key);
        true
    }

    /// Quantity stored at `key` on `side`
    ///
    /// # Panics
    ///
    /// Panics if an inline or fixed position for `side` holds a different
    /// key than the one requested, which means the placement invariant is
    /// broken.
    pub fn find(&self, side: Side, key: K) -> Option<&V> {
        match self.resolve(side, key)? {
            Resolved::Layer(index, tier) => self.slots[index].layer(tier)?.value(side),
            Resolved::Overflow(index, entry) => self.slots[index].overflow()[entry].node.value(side),
        }
    }

    /// Mutable quantity stored at `key` on `side`
    ///
    /// # Panics
    ///
    /// Same as [`HashOrderBook::find`].
    pub fn find_mut(&mut self, side: Side, key: K) -> Option<&mut V> {
        match self.resolve(side, key)? {
            Resolved::Layer(index, tier) => self.slots[index].layer_mut(tier)?.value_mut(side),
            Resolved::Overflow(index, entry) => {
                self.slots[index].overflow_node_mut(entry)?.value_mut(side)
            }
        }
    }

    /// Check if `key` is present on `side`
    #[inline]
    pub fn contains(&self, side: Side, key: K) -> bool {
        self.find(side, key).is_some()
    }

    /// Remove `key` from `side`.
    ///
    /// Returns `false` if nothing was stored there. The cached best bid and
    /// best offer are left untouched.
    ///
    /// # Panics
    ///
    /// Same as [`HashOrderBook::find`].
    pub fn erase(&mut self, side: Side, key: K) -> bool {
        self.remove(side, key).is_some()
    }

    /// Remove `key` from `side`, returning the stored quantity.
    ///
    /// # Panics
    ///
    /// Same as [`HashOrderBook::find`].
    pub fn remove(&mut self, side: Side, key: K) -> Option<V> {
        let removed = match self.resolve(side, key)? {
            Resolved::Layer(index, tier) => self.slots[index].layer_mut(tier)?.take(side),
            Resolved::Overflow(index, entry) => self.slots[index].take_overflow(entry, side),
        };
        let (_, value) = removed?;
        self.len -= 1;
        Some(value)
    }

    fn resolve(&self, side: Side, key: K) -> Option<Resolved> {
        let location = self.locate(side, key);
        let slot = &self.slots[location.index];

        match location.tier {
            Tier::Overflow(_) => slot
                .find_overflow(side, &key)
                .map(|entry| Resolved::Overflow(location.index, entry)),
            tier => {
                let stored = *slot.layer(tier)?.key(side)?;
                if stored != key {
                    BookFault::KeyMismatch {
                        index: location.index,
                        tier: tier.number(),
                        requested: format!("{key:?}"),
                        stored: format!("{stored:?}"),
                    }
                    .raise();
                }
                Some(Resolved::Layer(location.index, tier))
            }
        }
    }

    // ========================================================================
    // Best Bid/Offer and Mid
    // ========================================================================

    /// Cached best bid price, possibly stale after an erase
    #[inline]
    pub fn best_bid_price(&self) -> Option<K> {
        self.best_bid
    }

    /// Cached best offer price, possibly stale after an erase
    #[inline]
    pub fn best_offer_price(&self) -> Option<K> {
        self.best_offer
    }

    /// Best bid and its quantity.
    ///
    /// `None` if no bid was ever cached, or the cached one has been erased.
    pub fn get_best_bid(&self) -> Option<(K, &V)> {
        let key = self.best_bid?;
        self.find(Side::Bid, key).map(|value| (key, value))
    }

    /// Best offer and its quantity.
    ///
    /// `None` if no offer was ever cached, or the cached one has been erased.
    pub fn get_best_offer(&self) -> Option<(K, &V)> {
        let key = self.best_offer?;
        self.find(Side::Ask, key).map(|value| (key, value))
    }

    /// Inline node of the slot cached as the mid slot.
    ///
    /// A display aid: read [`HashOrderBook::get_best_bid`] and
    /// [`HashOrderBook::get_best_offer`] for the actual midpoint.
    #[inline]
    pub fn get_mid(&self) -> &PriceLevelNode<K, V> {
        self.slots[self.mid_index].inline()
    }

    fn update_bbo_and_mid(&mut self, side: Side, key: K) {
        let best = match side {
            Side::Bid => &mut self.best_bid,
            Side::Ask => &mut self.best_offer,
        };
        let improved = best.map_or(true, |current| side.improves(&key, &current));
        if !improved {
            return;
        }
        *best = Some(key);
        self.refresh_mid_index(side);
    }

    fn refresh_mid_index(&mut self, side: Side) {
        self.mid_index = match (self.best_bid, self.best_offer) {
            (Some(bid), Some(offer)) => {
                let mid = bid.midpoint(offer);
                let location = self.locate(side, mid);
                if location.tier != Tier::Inline {
                    BookFault::ExcessiveDrift {
                        mid: format!("{mid:?}"),
                        reference: format!("{:?}", self.reference_mid),
                    }
                    .raise();
                }
                location.index
            }
            _ => self.single_side_mid_index(),
        };
    }

    /// Mid slot after a rehash. Never faults: a mid outside the inline tier
    /// falls back to the best bid's own slot.
    fn settle_mid_index(&mut self) {
        self.mid_index = match (self.best_bid, self.best_offer) {
            (Some(bid), Some(offer)) => {
                let location = self.locate(Side::Bid, bid.midpoint(offer));
                if location.tier == Tier::Inline {
                    location.index
                } else {
                    self.locate(Side::Bid, bid).index
                }
            }
            _ => self.single_side_mid_index(),
        };
    }

    fn single_side_mid_index(&self) -> usize {
        match (self.best_bid, self.best_offer) {
            (Some(bid), _) => self.locate(Side::Bid, bid).index,
            (None, Some(offer)) => self.locate(Side::Ask, offer).index,
            (None, None) => self.indexer.centre(),
        }
    }

    // ========================================================================
    // Rehash and Clear
    // ========================================================================

    /// Rebuild the slot array around `new_reference_mid`.
    ///
    /// Every live entry is moved into a freshly allocated array of the same
    /// shape; lookups return the same values afterwards. Cost scales with
    /// the configured capacity plus the overflow entries, not with the
    /// number of live entries.
    ///
    /// The mid slot is recomputed without the drift check, so a rehash is
    /// always a way back from a drifted mid.
    ///
    /// # Panics
    ///
    /// Panics if two live entries collide in the new layout.
    pub fn rehash(&mut self, new_reference_mid: K) {
        let old_reference = self.reference_mid;
        let mut replacement = Self::allocate_slots(&self.indexer);
        let mut live = 0;

        for slot in mem::take(&mut self.slots) {
            for (side, key, value) in slot.into_entries() {
                let location = self.indexer.locate(side, key, new_reference_mid);
                if place(&mut replacement, location, side, key, value).is_err() {
                    BookFault::RehashCollision {
                        reference: format!("{new_reference_mid:?}"),
                        side: side.to_string(),
                        key: format!("{key:?}"),
                    }
                    .raise();
                }
                live += 1;
            }
        }

        self.slots = replacement;
        self.reference_mid = new_reference_mid;
        self.len = live;
        self.settle_mid_index();

        debug!(
            old_reference = ?old_reference,
            new_reference = ?new_reference_mid,
            live,
            "order book rehashed"
        );
    }

    /// Remove every entry and reset the cached BBO, keeping the slot array.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.clear();
        }
        self.len = 0;
        self.best_bid = None;
        self.best_offer = None;
        self.mid_index = self.indexer.centre();

        debug!(reference = ?self.reference_mid, "order book cleared");
    }

    /// [`HashOrderBook::clear`] and move the reference price to `new_reference_mid`.
    pub fn clear_with_mid(&mut self, new_reference_mid: K) {
        self.reference_mid = new_reference_mid;
        self.clear();
    }

    // ========================================================================
    // Ordered Iteration
    // ========================================================================

    /// Cursor at the best occupied level of `side`, or at the end.
    #[inline]
    pub fn cursor(&self, side: Side) -> Cursor {
        Cursor::begin(self, side)
    }

    /// Nodes of `side` from the best price outwards.
    ///
    /// Each node may also carry an entry for the other side; read
    /// [`PriceLevelNode::entry`] with the iterated side.
    ///
    /// ```
    /// use hash_orderbook::{BookConfig, HashOrderBook, Side};
    ///
    /// let mut book = HashOrderBook::new(BookConfig::new(1u64, 10, 3), 110).unwrap();
    /// for (price, qty) in [(111, 1u64), (118, 2), (113, 3)] {
    ///     book.insert(Side::Ask, price, qty);
    /// }
    ///
    /// let asks: Vec<_> = book
    ///     .levels(Side::Ask)
    ///     .filter_map(|node| node.entry(Side::Ask))
    ///     .map(|(price, qty)| (*price, *qty))
    ///     .collect();
    /// assert_eq!(asks, vec![(111, 1), (113, 3), (118, 2)]);
    /// ```
    #[inline]
    pub fn levels(&self, side: Side) -> Levels<'_, K, V> {
        Levels::new(self, self.cursor(side))
    }

    /// Bid levels, best (highest) first
    #[inline]
    pub fn bids(&self) -> Levels<'_, K, V> {
        self.levels(Side::Bid)
    }

    /// Ask levels, best (lowest) first
    #[inline]
    pub fn asks(&self) -> Levels<'_, K, V> {
        self.levels(Side::Ask)
    }
}

/// Dispatch an entry into the tier `location` selects.
fn place<K: PriceKey, V>(
    slots: &mut [Slot<K, V>],
    location: Location,
    side: Side,
    key: K,
    value: V,
) -> Result<(), (K, V)> {
    let slot = &mut slots[location.index];
    match location.tier {
        Tier::Overflow(tier) => slot.insert_overflow(side, key, value, tier),
        tier => match slot.layer_mut(tier) {
            Some(node) => node.try_set(side, key, value),
            None => Err((key, value)),
        },
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
