//! `loan-risk` library crate.
//!
//! The binary (`loanrisk`) is a thin wrapper around this library so that:
//!
//! - feature derivation and blending are testable without spawning processes
//! - the scoring context can be embedded elsewhere (services, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod report;
pub mod scoring;
