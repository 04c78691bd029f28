//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw applicant record and its typed counterpart (`RawApplicantRecord`, `ApplicantInput`)
//! - the categorical input domains (`Gender`, `LoanPurpose`, `GradeSubgrade`, ...)
//! - the feature schema and assembled feature vector (`FeatureSchema`, `FeatureVector`)
//! - scoring outputs (`ScoreResult`, `Verdict`)

pub mod categories;
pub mod types;

pub use categories::*;
pub use types::*;
