//! Types library for limit-order-book tick archives
//!
//! Shared data model for the decode-and-aggregate pipeline: the fixed-width
//! raw tick record and its wire layout, the regularized snapshot and one-minute
//! bar records derived from it, calendar/period identifiers, price scaling and
//! the named-column feature table that carries derived metrics.
//!
//! # Modules
//! - `ids`: Asset codes and archive period identifiers
//! - `numeric`: Price tick scaling and time-of-day helpers
//! - `tick`: Raw 54-byte tick record and its field layout
//! - `snapshot`: Fixed-interval snapshot records and series
//! - `bar`: One-minute OHLC bar records and series
//! - `features`: Extensible named-column feature table
//! - `errors`: Error taxonomy for model parsing

pub mod ids;
pub mod numeric;
pub mod tick;
pub mod snapshot;
pub mod bar;
pub mod features;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bar::*;
    pub use crate::errors::*;
    pub use crate::features::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::snapshot::*;
    pub use crate::tick::*;
}
