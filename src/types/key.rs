//! Price key contract for the indexing engine.
//!
//! ## Overview
//!
//! The book never stores prices in a sorted structure. It turns a price into
//! a signed number of ticks away from the reference mid price and uses that
//! offset as an array position. The only arithmetic a key type therefore
//! needs is:
//!
//! - equality (to resolve collisions in the overflow tier)
//! - subtraction followed by truncating division by the tick size
//! - a midpoint, for tracking the mid slot from best bid and best offer
//!
//! ## Implementations
//!
//! All primitive integers up to 64 bits, plus `rust_decimal::Decimal`.
//! Integer arithmetic is widened to `i128`, so an unsigned key below the
//! reference price yields a negative offset instead of wrapping.
//!
//! ```
//! use hash_orderbook::types::PriceKey;
//! use rust_decimal::Decimal;
//!
//! assert_eq!(104u64.offset_in_ticks(110, 1), -6);
//! assert_eq!(Decimal::new(10025, 2).offset_in_ticks(Decimal::new(100, 0), Decimal::new(5, 2)), 5);
//! ```

use std::fmt::Debug;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Numeric contract required of a price key.
pub trait PriceKey: Copy + Ord + Debug {
    /// `(self - reference) / tick_size`, truncated toward zero.
    ///
    /// Saturates at the `i64` bounds instead of overflowing.
    fn offset_in_ticks(self, reference: Self, tick_size: Self) -> i64;

    /// Price halfway between `self` and `other`, truncated like integer division.
    fn midpoint(self, other: Self) -> Self;

    /// Whether this value can be used as a tick size (strictly positive).
    fn is_valid_tick(self) -> bool;
}

#[inline]
fn saturate_i128(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

macro_rules! impl_price_key_for_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl PriceKey for $t {
                #[inline]
                fn offset_in_ticks(self, reference: Self, tick_size: Self) -> i64 {
                    let diff = self as i128 - reference as i128;
                    saturate_i128(diff / tick_size as i128)
                }

                #[inline]
                fn midpoint(self, other: Self) -> Self {
                    ((self as i128 + other as i128) / 2) as $t
                }

                #[inline]
                fn is_valid_tick(self) -> bool {
                    self > 0
                }
            }
        )*
    };
}

impl_price_key_for_int!(i32, i64, isize, u32, u64, usize);

impl PriceKey for Decimal {
    fn offset_in_ticks(self, reference: Self, tick_size: Self) -> i64 {
        let ticks = self
            .checked_sub(reference)
            .and_then(|diff| diff.checked_div(tick_size))
            .map(|ticks| ticks.trunc());

        match ticks {
            Some(ticks) => ticks
                .to_i64()
                .unwrap_or(if ticks.is_sign_negative() { i64::MIN } else { i64::MAX }),
            None if self < reference => i64::MIN,
            None => i64::MAX,
        }
    }

    fn midpoint(self, other: Self) -> Self {
        let half = (other - self) / Decimal::TWO;
        self + half
    }

    fn is_valid_tick(self) -> bool {
        self > Decimal::ZERO
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
