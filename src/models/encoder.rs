//! Categorical encoding shared by the bundled estimators.
//!
//! An encoder maps `feature name -> category label -> numeric code`. Numeric
//! feature values pass through untouched. An unknown label is a prediction
//! error: the model never saw it, and guessing a code would silently change
//! the score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, FieldValue};
use crate::error::ScoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryEncoder {
    columns: HashMap<String, HashMap<String, f64>>,
}

impl CategoryEncoder {
    pub fn new(columns: HashMap<String, HashMap<String, f64>>) -> Self {
        Self { columns }
    }

    /// Encode a feature vector into a dense numeric row (same order).
    pub fn encode(&self, estimator: &str, features: &FeatureVector) -> Result<Vec<f64>, ScoreError> {
        features
            .iter()
            .map(|(name, value)| self.encode_value(estimator, name, value))
            .collect()
    }

    fn encode_value(&self, estimator: &str, name: &str, value: &FieldValue) -> Result<f64, ScoreError> {
        match value {
            FieldValue::Number(v) => Ok(*v),
            FieldValue::Category(label) => {
                let table = self.columns.get(name).ok_or_else(|| {
                    ScoreError::prediction(
                        estimator,
                        format!("feature '{name}' is categorical but the model has no encoding for it"),
                    )
                })?;
                table.get(label).copied().ok_or_else(|| {
                    ScoreError::prediction(
                        estimator,
                        format!("unknown category '{label}' for feature '{name}'"),
                    )
                })
            }
        }
    }

    /// Reject non-finite codes (load-time check).
    pub fn validate(&self) -> Result<(), String> {
        for (column, table) in &self.columns {
            if table.is_empty() {
                return Err(format!("encoder for '{column}' has no categories"));
            }
            if let Some((label, code)) = table.iter().find(|(_, code)| !code.is_finite()) {
                return Err(format!("encoder for '{column}' maps '{label}' to non-finite {code}"));
            }
        }
        Ok(())
    }
}
