//! Probability estimators.
//!
//! The scorer only sees the [`Estimator`] trait. Two concrete, serializable
//! implementations ship with the crate so that exported models can be loaded
//! without a foreign runtime:
//!
//! - `logistic`: standardized logistic regression
//! - `tree`: additive tree ensemble with a logistic link
//!
//! Both turn categorical values into numbers through an [`encoder::CategoryEncoder`].

pub mod artifact;
pub mod encoder;
pub mod estimator;
pub mod logistic;
pub mod tree;

pub use artifact::*;
pub use encoder::*;
pub use estimator::*;
pub use logistic::*;
pub use tree::*;
