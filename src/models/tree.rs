//! Additive tree ensemble with a logistic link.
//!
//! Each tree is a flat node array; node `0` is the root. A sample goes left
//! when `x[feature] <= threshold`. The raw margin is
//! `base_score + Σ leaf_value(tree)` and the probability is `sigmoid(margin)`.
//!
//! Child indices must point strictly forward, so every walk terminates in at
//! most `nodes.len()` steps.

use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::error::ScoreError;
use crate::models::encoder::CategoryEncoder;
use crate::models::estimator::{Estimator, sigmoid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!("node {idx} splits on feature {feature} (only {n_features})"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx} has a non-finite threshold"));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {idx} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree for one encoded row and return the leaf value.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Serialized form of a tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsembleSpec {
    pub name: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub encoders: CategoryEncoder,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    name: String,
    features: Vec<String>,
    encoders: CategoryEncoder,
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Validate a spec and build the model.
    pub fn from_spec(spec: TreeEnsembleSpec) -> Result<Self, String> {
        let n = spec.features.len();
        if n == 0 {
            return Err("tree ensemble declares no features".to_string());
        }
        if spec.trees.is_empty() {
            return Err("tree ensemble has no trees".to_string());
        }
        if !spec.base_score.is_finite() {
            return Err("tree ensemble has a non-finite base_score".to_string());
        }
        for (i, tree) in spec.trees.iter().enumerate() {
            tree.validate(n).map_err(|e| format!("tree {i}: {e}"))?;
        }
        spec.encoders.validate()?;

        Ok(Self {
            name: spec.name,
            features: spec.features,
            encoders: spec.encoders,
            base_score: spec.base_score,
            trees: spec.trees,
        })
    }

    /// Raw additive margin before the logistic link.
    pub fn margin(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let row = self.encoders.encode(&self.name, features)?;
        if row.len() != self.features.len() {
            return Err(ScoreError::prediction(
                &self.name,
                format!("expected {} features, got {}", self.features.len(), row.len()),
            ));
        }
        if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
            return Err(ScoreError::prediction(
                &self.name,
                format!("feature '{}' is not finite", self.features[pos]),
            ));
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.predict(&row)).sum::<f64>())
    }
}

impl Estimator for TreeEnsemble {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        Ok(sigmoid(self.margin(features)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<&[String]> {
        Some(&self.features)
    }
}
