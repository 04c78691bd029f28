//! Feature derivation.
//!
//! Responsibilities:
//!
//! - compute the seven engineered ratio/interaction features from raw fields
//! - select and order raw + derived values into the schema's column order
//! - declare which raw fields a schema needs, and how to parse them (`catalog`)

pub mod catalog;
pub mod derive;

pub use catalog::*;
pub use derive::*;
