//! Indexing engine: price to slot mapping.
//!
//! ## Placement
//!
//! A price is turned into a signed *raw* position relative to the centre of
//! the slot array:
//!
//! ```text
//! offset = (key - reference_mid) / tick_size      (truncating)
//! raw    = fast_book_size / 2 + offset
//! index  = raw mod fast_book_size                  (always positive)
//! ```
//!
//! The tier counts how many times `raw` wrapped around the array. Positive
//! wraps count `0, 1, 2, ..` and negative wraps count `1, 2, ..`, so that
//! index 0 of tier 1 sits next to the last index of tier 0 in price terms
//! on the bid side:
//!
//! ```text
//! raw    -11 -10  -1 |  0   9 | 10  19 | 20
//! index    9   0   9 |  0   9 |  0   9 |  0
//! tier     2   1   1 |  0   0 |  1   1 |  2
//! ```
//!
//! ## Asymmetric Override
//!
//! Layered tiers hold resting depth on the worse side of the reference:
//! lower bids and higher asks. A bid above the window (`raw > fast_book_size`)
//! or an ask below it (`raw < 0`) is always routed to the overflow tier.

use std::ops::RangeInclusive;

use crate::config::BookConfig;
use crate::error::ConfigError;
use crate::types::{PriceKey, Side};

/// Storage tier a position resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The slot's inline node (tier 0)
    Inline,
    /// Zero-based index into the slot's fixed collision array (tier `i + 1`)
    Fixed(usize),
    /// The slot's overflow list, tagged with the tier number
    Overflow(usize),
}

impl Tier {
    /// Tier number: 0 inline, `1..=N` fixed, `> N` overflow.
    #[inline]
    pub fn number(self) -> usize {
        match self {
            Tier::Inline => 0,
            Tier::Fixed(i) => i + 1,
            Tier::Overflow(tier) => tier,
        }
    }
}

/// Result of locating a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Slot index in `[0, fast_book_size)`
    pub index: usize,
    /// Tier within the slot
    pub tier: Tier,
    fits: bool,
}

impl Location {
    /// Tier number of this location
    #[inline]
    pub fn tier_number(&self) -> usize {
        self.tier.number()
    }

    /// Whether the tier number lies strictly below the collision tier count.
    ///
    /// Informational only. Storage goes by [`Location::tier`]: the last fixed
    /// tier (`tier_number == collision_tier_count`) is still stored in the
    /// fixed array but reports `false` here.
    #[inline]
    pub fn fits_in_layers(&self) -> bool {
        self.fits
    }

    /// Whether the entry lives in the slot's overflow list
    #[inline]
    pub fn is_overflow(&self) -> bool {
        matches!(self.tier, Tier::Overflow(_))
    }
}

/// Pure mapping from `(side, key, reference)` to a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indexer<K> {
    config: BookConfig<K>,
}

impl<K: PriceKey> Indexer<K> {
    /// Build an indexer from a configuration, rejecting divide-by-zero shapes.
    pub fn new(config: BookConfig<K>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration
    #[inline]
    pub fn config(&self) -> &BookConfig<K> {
        &self.config
    }

    /// Slot index of the reference price itself
    #[inline]
    pub fn centre(&self) -> usize {
        self.config.fast_book_size / 2
    }

    /// Signed position of `key` relative to slot 0 of tier 0.
    #[inline]
    pub fn raw_position(&self, key: K, reference: K) -> i64 {
        let offset = key.offset_in_ticks(reference, self.config.tick_size);
        (self.centre() as i64).saturating_add(offset)
    }

    /// Locate a key around `reference`.
    ///
    /// # Example
    ///
    /// ```
    /// use hash_orderbook::{BookConfig, Side};
    /// use hash_orderbook::orderbook::{Indexer, Tier};
    ///
    /// let indexer = Indexer::new(BookConfig::new(1u64, 10, 3)).unwrap();
    ///
    /// let loc = indexer.locate(Side::Ask, 115, 110);
    /// assert_eq!(loc.index, 0);
    /// assert_eq!(loc.tier, Tier::Fixed(0));
    /// ```
    pub fn locate(&self, side: Side, key: K, reference: K) -> Location {
        let size = self.config.fast_book_size;
        let raw = self.raw_position(key, reference);
        let index = positive_mod(raw, size);

        let crosses_window = match side {
            Side::Bid => raw > size as i64,
            Side::Ask => raw < 0,
        };
        if crosses_window {
            return Location {
                index,
                tier: Tier::Overflow(self.config.collision_tier_count + 1),
                fits: false,
            };
        }

        let tier = tier_of_raw(raw, size);
        Location {
            index,
            tier: self.classify(tier),
            fits: tier < self.config.collision_tier_count,
        }
    }

    /// Map a tier number onto the storage tier that holds it.
    #[inline]
    pub fn classify(&self, tier: usize) -> Tier {
        match tier {
            0 => Tier::Inline,
            t if t <= self.config.collision_tier_count => Tier::Fixed(t - 1),
            t => Tier::Overflow(t),
        }
    }

    // ========================================================================
    // Walking order (used by cursors)
    // ========================================================================

    /// Raw positions of `side` that are stored in the inline or fixed tiers.
    ///
    /// Asks occupy `[0, layered_capacity)`. Bids occupy `[-N * size, size]`,
    /// where `raw == size` shares index 0 of tier 1 with `raw == -size`.
    pub fn layered_raw_range(&self, side: Side) -> RangeInclusive<i64> {
        let size = self.config.fast_book_size as i64;
        let tiers = self.config.collision_tier_count as i64;
        match side {
            Side::Ask => 0..=(self.config.layered_capacity() as i64).saturating_sub(1),
            Side::Bid if tiers == 0 => 0..=size - 1,
            Side::Bid => tiers.saturating_mul(size).saturating_neg()..=size,
        }
    }

    /// Slot index and tier number of a raw position.
    #[inline]
    pub fn position_of_raw(&self, raw: i64) -> (usize, usize) {
        let size = self.config.fast_book_size;
        (positive_mod(raw, size), tier_of_raw(raw, size))
    }
}

/// `raw mod size`, always in `[0, size)`.
#[inline]
pub fn positive_mod(raw: i64, size: usize) -> usize {
    raw.rem_euclid(size as i64) as usize
}

/// Wrap count of a raw position: `raw / size` for `raw >= 0`,
/// `|raw + 1| / size + 1` below zero.
#[inline]
pub fn tier_of_raw(raw: i64, size: usize) -> usize {
    if raw >= 0 {
        (raw as u64 / size as u64) as usize
    } else {
        let below = (-(raw + 1)) as u64;
        (below / size as u64) as usize + 1
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
