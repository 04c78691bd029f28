//! Serialized estimator artifacts.
//!
//! An artifact is a JSON object tagged by `kind`:
//!
//! ```json
//! { "kind": "logistic", "name": "...", "features": [...], "coefficients": [...], "intercept": 0.0 }
//! { "kind": "tree_ensemble", "name": "...", "features": [...], "base_score": 0.0, "trees": [...] }
//! ```
//!
//! Reading from disk lives in `io::artifacts`; this module only turns a parsed
//! artifact into a validated, boxed [`Estimator`].

use serde::{Deserialize, Serialize};

use crate::models::estimator::Estimator;
use crate::models::logistic::{LogisticModel, LogisticSpec};
use crate::models::tree::{TreeEnsemble, TreeEnsembleSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorArtifact {
    Logistic(LogisticSpec),
    TreeEnsemble(TreeEnsembleSpec),
}

impl EstimatorArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            EstimatorArtifact::Logistic(_) => "logistic",
            EstimatorArtifact::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EstimatorArtifact::Logistic(spec) => &spec.name,
            EstimatorArtifact::TreeEnsemble(spec) => &spec.name,
        }
    }

    /// Validate structure and build the estimator.
    pub fn into_estimator(self) -> Result<Box<dyn Estimator>, String> {
        match self {
            EstimatorArtifact::Logistic(spec) => Ok(Box::new(LogisticModel::from_spec(spec)?)),
            EstimatorArtifact::TreeEnsemble(spec) => Ok(Box::new(TreeEnsemble::from_spec(spec)?)),
        }
    }
}
