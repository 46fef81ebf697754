//! Price-ordered traversal of one side of the book.
//!
//! ## Walking Order
//!
//! A cursor starts at the cached best price of its side and walks towards
//! worse prices: upwards for asks, downwards for bids. Progress is measured
//! in raw positions (tick offsets around the reference), which fall into
//! three bands per side:
//!
//! ```text
//! asks:  raw < 0            | 0 ..= layered_capacity - 1 | beyond
//! bids:  raw > size         | size ..= -N * size         | beyond
//!        overflow, override | inline and fixed tiers     | overflow
//! ```
//!
//! Inside the layered band every raw position has a home, so the cursor
//! steps one position at a time. In the overflow bands it jumps straight to
//! the nearest entry further along the walk, ranked by the raw position of
//! the entry's own price.
//!
//! ## Cursors and Iterators
//!
//! [`Cursor`] is a plain position that borrows nothing. Reading and writing
//! go through [`Cursor::node`] and [`Cursor::node_mut`], so the same cursor
//! type serves both. [`Levels`] wraps a cursor and a shared borrow of the
//! book into a standard iterator.
//!
//! A cursor kept across a mutation of the book (insert, erase, rehash,
//! clear) no longer describes a meaningful position. It stays memory safe,
//! but what it yields afterwards is unspecified.

use std::iter::FusedIterator;

use crate::orderbook::book::HashOrderBook;
use crate::orderbook::node::PriceLevelNode;
use crate::types::{PriceKey, Side};

/// Position of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// At slot `index`, tier number `tier`; `entry` selects the overflow
    /// entry when the level lives in the overflow list.
    Positioned {
        /// Raw position of the level's price around the reference
        raw: i64,
        /// Slot index
        index: usize,
        /// Tier number
        tier: usize,
        /// Overflow list position, `None` for inline/fixed tiers
        entry: Option<usize>,
    },
    /// Past the worst occupied level
    End,
}

/// Detached position on one side of a [`HashOrderBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    side: Side,
    position: Position,
}

impl Cursor {
    /// A cursor past the end of `side`
    #[inline]
    pub fn end(side: Side) -> Self {
        Self {
            side,
            position: Position::End,
        }
    }

    /// Cursor at the cached best price of `side`, moved forward to the first
    /// occupied level if that price has since been erased.
    pub fn begin<K: PriceKey, V>(book: &HashOrderBook<K, V>, side: Side) -> Self {
        let best = match side {
            Side::Bid => book.best_bid_price(),
            Side::Ask => book.best_offer_price(),
        };
        let Some(best) = best else {
            return Self::end(side);
        };

        let location = book.locate(side, best);
        let entry = if location.is_overflow() {
            book.slots()[location.index].find_overflow(side, &best)
        } else {
            None
        };

        let mut cursor = Self {
            side,
            position: Position::Positioned {
                raw: book.indexer().raw_position(best, book.reference_mid()),
                index: location.index,
                tier: location.tier_number(),
                entry,
            },
        };
        let holds_best = cursor.entry(book).is_some_and(|(key, _)| *key == best);
        if !holds_best {
            cursor.advance(book);
        }
        cursor
    }

    /// Side this cursor walks
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Current position
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether the cursor has run past the last level
    #[inline]
    pub fn is_end(&self) -> bool {
        self.position == Position::End
    }

    /// Cursor at the identical position, walking the opposite side.
    ///
    /// Useful for comparing both sides of one price level without locating
    /// the price again. The node there may hold nothing for the other side,
    /// and advancing it continues from this price on the other side's walk.
    #[inline]
    pub fn opposite_side(&self) -> Self {
        Self {
            side: self.side.opposite(),
            position: self.position,
        }
    }

    /// Node at the current position, both sides included.
    pub fn node<'a, K: PriceKey, V>(
        &self,
        book: &'a HashOrderBook<K, V>,
    ) -> Option<&'a PriceLevelNode<K, V>> {
        let Position::Positioned {
            index, tier, entry, ..
        } = self.position
        else {
            return None;
        };
        let slot = book.slots().get(index)?;
        match entry {
            Some(entry) => slot.overflow().get(entry).map(|e| &e.node),
            None => slot.layer(book.indexer().classify(tier)),
        }
    }

    /// Mutable node at the current position.
    ///
    /// Quantities can be changed through [`PriceLevelNode::value_mut`];
    /// prices and occupancy cannot, so the book's bookkeeping stays valid.
    pub fn node_mut<'a, K: PriceKey, V>(
        &self,
        book: &'a mut HashOrderBook<K, V>,
    ) -> Option<&'a mut PriceLevelNode<K, V>> {
        let Position::Positioned {
            index, tier, entry, ..
        } = self.position
        else {
            return None;
        };
        let tier = book.indexer().classify(tier);
        let slot = book.slots_mut().get_mut(index)?;
        match entry {
            Some(entry) => slot.overflow_node_mut(entry),
            None => slot.layer_mut(tier),
        }
    }

    /// `(price, quantity)` for this cursor's side at the current position
    #[inline]
    pub fn entry<'a, K: PriceKey, V>(
        &self,
        book: &'a HashOrderBook<K, V>,
    ) -> Option<(&'a K, &'a V)> {
        self.node(book)?.entry(self.side)
    }

    /// Move to the next occupied level of this side, or to the end.
    pub fn advance<K: PriceKey, V>(&mut self, book: &HashOrderBook<K, V>) {
        let Position::Positioned { raw, entry, .. } = self.position else {
            return;
        };
        let after = (self.rank(raw), entry);

        let layers = book.indexer().layered_raw_range(self.side);
        let first_layered = match self.side {
            Side::Ask => *layers.start(),
            Side::Bid => *layers.end(),
        };
        let layers_ahead = after.0 < self.rank(first_layered);

        if layers_ahead {
            let crossing = self
                .next_overflow(book, after)
                .filter(|(rank, _)| *rank < self.rank(first_layered));
            if let Some((_, position)) = crossing {
                self.position = position;
                return;
            }
        }
        if layers_ahead || layers.contains(&raw) {
            if let Some(position) = self.next_layered(book, raw) {
                self.position = position;
                return;
            }
        }
        self.position = self
            .next_overflow(book, after)
            .map_or(Position::End, |(_, position)| position);
    }

    /// Walk rank of a raw position: grows as prices worsen.
    #[inline]
    fn rank(&self, raw: i64) -> i128 {
        match self.side {
            Side::Ask => raw as i128,
            Side::Bid => -(raw as i128),
        }
    }

    /// First occupied inline/fixed level strictly beyond `raw`.
    ///
    /// A layered node only counts if its key really sits at the raw position
    /// being visited: the top bid of the window shares its node with the bid
    /// one wrap below.
    fn next_layered<K: PriceKey, V>(&self, book: &HashOrderBook<K, V>, raw: i64) -> Option<Position> {
        let indexer = book.indexer();
        let reference = book.reference_mid();
        let layers = indexer.layered_raw_range(self.side);

        let mut candidate = match self.side {
            Side::Ask => raw.saturating_add(1).max(*layers.start()),
            Side::Bid => raw.saturating_sub(1).min(*layers.end()),
        };
        while layers.contains(&candidate) {
            let (index, tier) = indexer.position_of_raw(candidate);
            let key = book.slots()[index]
                .layer(indexer.classify(tier))
                .and_then(|node| node.key(self.side));
            if let Some(key) = key {
                if indexer.raw_position(*key, reference) == candidate {
                    return Some(Position::Positioned {
                        raw: candidate,
                        index,
                        tier,
                        entry: None,
                    });
                }
            }
            let next = match self.side {
                Side::Ask => candidate.checked_add(1),
                Side::Bid => candidate.checked_sub(1),
            };
            candidate = next?;
        }
        None
    }

    /// Nearest overflow entry ranked strictly after `after`, ties at one raw
    /// position broken by storage order.
    fn next_overflow<K: PriceKey, V>(
        &self,
        book: &HashOrderBook<K, V>,
        after: (i128, Option<usize>),
    ) -> Option<(i128, Position)> {
        let indexer = book.indexer();
        let reference = book.reference_mid();
        let mut nearest: Option<((i128, Option<usize>), Position)> = None;

        for (index, slot) in book.slots().iter().enumerate() {
            for (position, entry) in slot.overflow().iter().enumerate() {
                let Some(key) = entry.node.key(self.side) else {
                    continue;
                };
                let raw = indexer.raw_position(*key, reference);
                let order = (self.rank(raw), Some(position));
                if order <= after {
                    continue;
                }
                if nearest.as_ref().is_some_and(|(best, _)| *best <= order) {
                    continue;
                }
                nearest = Some((
                    order,
                    Position::Positioned {
                        raw,
                        index,
                        tier: entry.tier,
                        entry: Some(position),
                    },
                ));
            }
        }

        nearest.map(|((rank, _), position)| (rank, position))
    }
}

/// Iterator over the nodes of one side, best price first.
#[derive(Debug, Clone)]
pub struct Levels<'a, K, V> {
    book: &'a HashOrderBook<K, V>,
    cursor: Cursor,
}

impl<'a, K: PriceKey, V> Levels<'a, K, V> {
    pub(crate) fn new(book: &'a HashOrderBook<K, V>, cursor: Cursor) -> Self {
        Self { book, cursor }
    }

    /// Cursor at the node the next call to `next` will yield
    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl<'a, K: PriceKey, V> Iterator for Levels<'a, K, V> {
    type Item = &'a PriceLevelNode<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor.node(self.book)?;
        self.cursor.advance(self.book);
        Some(node)
    }
}

impl<K: PriceKey, V> FusedIterator for Levels<'_, K, V> {}

// ============================================================================
// Unit Tests
// ============================================================================
