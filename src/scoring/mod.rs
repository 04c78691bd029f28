//! Risk scoring: run both estimators, blend, clip, and classify.

pub mod blend;

pub use blend::*;
