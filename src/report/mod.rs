//! Reporting utilities: formatted terminal output and JSON reports.

pub mod format;

pub use format::*;
