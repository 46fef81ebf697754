//! Core value types for the hash order book
//!
//! ## Types
//!
//! - [`Side`]: Bid or Ask
//! - [`PriceKey`]: numeric contract a price type must satisfy to be indexed
//!
//! ## Price Keys
//!
//! Keys are never compared for ordering inside the storage engine except to
//! maintain the cached best bid and best offer. Placement is derived purely
//! from the tick offset to the reference mid price.

mod side;
mod key;

pub use side::Side;
pub use key::PriceKey;
