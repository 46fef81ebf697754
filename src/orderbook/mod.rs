//! Order book storage module.
//!
//! ## Architecture
//!
//! The book is a fixed array of slots addressed by a price's tick offset
//! from a reference mid price:
//!
//! - **Indexing**: [`Indexer`] maps `(side, price)` to a slot and a [`Tier`]
//! - **Nodes**: [`PriceLevelNode`] holds one optional entry per side
//! - **Slots**: [`Slot`] owns an inline node, a fixed collision array and an
//!   overflow list
//! - **Book**: [`HashOrderBook`] ties them together with BBO tracking,
//!   rehashing and ordered traversal through [`Cursor`] and [`Levels`]
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Insert | O(1)* |
//! | Find / erase | O(1)* |
//! | Best bid/offer | O(1) |
//! | Rehash | O(capacity) |
//! | Next level | O(gap) in layers, O(overflow) beyond |
//!
//! *O(k) in a slot's overflow list of length k
//!
//! ## Example
//!
//! ```
//! use hash_orderbook::orderbook::HashOrderBook;
//! use hash_orderbook::{BookConfig, Side};
//!
//! let mut book = HashOrderBook::new(BookConfig::new(1i64, 100, 4), 50_000).unwrap();
//!
//! book.insert(Side::Bid, 49_998, 300u64);
//! book.insert(Side::Ask, 50_003, 200u64);
//!
//! assert_eq!(book.best_bid_price(), Some(49_998));
//! assert_eq!(book.best_offer_price(), Some(50_003));
//! ```

pub mod index;
pub mod node;
pub mod slot;
pub mod book;
pub mod cursor;

pub use index::{positive_mod, tier_of_raw, Indexer, Location, Tier};
pub use node::{OverflowEntry, PriceLevelNode};
pub use slot::Slot;
pub use book::HashOrderBook;
pub use cursor::{Cursor, Levels, Position};
