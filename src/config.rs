//! Construction-time configuration of a book.
//!
//! All three parameters are fixed for the life of a [`HashOrderBook`]
//! (a rehash keeps the shape and only moves the reference price).
//!
//! | Parameter              | Meaning                                           |
//! |------------------------|---------------------------------------------------|
//! | `tick_size`            | Minimum price increment                           |
//! | `fast_book_size`       | Number of slots (bid and ask depth combined)      |
//! | `collision_tier_count` | Fixed-array depth per slot before overflow        |
//!
//! [`HashOrderBook`]: crate::orderbook::HashOrderBook

use crate::error::ConfigError;
use crate::types::PriceKey;

/// Shape and tick size of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookConfig<K> {
    /// Minimum price increment
    pub tick_size: K,
    /// Number of slots in the primary array
    pub fast_book_size: usize,
    /// Number of fixed collision nodes per slot
    pub collision_tier_count: usize,
}

impl<K: PriceKey> BookConfig<K> {
    /// Create a configuration. Validation happens in [`BookConfig::validate`]
    /// and again when a book is built from it.
    ///
    /// # Example
    ///
    /// ```
    /// use hash_orderbook::BookConfig;
    ///
    /// let config = BookConfig::new(1u64, 10, 3);
    /// assert!(config.validate().is_ok());
    /// assert!(BookConfig::new(0u64, 10, 3).validate().is_err());
    /// ```
    pub fn new(tick_size: K, fast_book_size: usize, collision_tier_count: usize) -> Self {
        Self {
            tick_size,
            fast_book_size,
            collision_tier_count,
        }
    }

    /// Check that the configuration can drive the indexing engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_size.is_valid_tick() {
            return Err(ConfigError::InvalidTickSize);
        }
        if self.fast_book_size == 0 {
            return Err(ConfigError::ZeroFastBookSize);
        }
        Ok(())
    }

    /// Total layered capacity per side: inline plus fixed tiers across all slots.
    #[inline]
    pub fn layered_capacity(&self) -> usize {
        self.fast_book_size * (1 + self.collision_tier_count)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
