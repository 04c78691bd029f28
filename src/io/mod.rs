//! Input/output helpers.
//!
//! - model artifact + schema loading (`artifacts`)
//! - applicant CSV ingest + validation (`ingest`)
//! - batch result export (`export`)

pub mod artifacts;
pub mod export;
pub mod ingest;

pub use artifacts::*;
pub use export::*;
pub use ingest::*;
