//! Standardized logistic regression.
//!
//! ```text
//! p = sigmoid(intercept + Σ coef_i * (x_i - mean_i) / scale_i)
//! ```
//!
//! The optional scaler mirrors a standard-scaler preprocessing step; without it
//! the raw encoded row is used directly.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::error::ScoreError;
use crate::models::encoder::CategoryEncoder;
use crate::models::estimator::{Estimator, sigmoid};

/// Per-column standardization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Serialized form of a logistic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticSpec {
    pub name: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub encoders: CategoryEncoder,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticModel {
    name: String,
    features: Vec<String>,
    encoders: CategoryEncoder,
    mean: DVector<f64>,
    inv_scale: DVector<f64>,
    coefficients: DVector<f64>,
    intercept: f64,
}

impl LogisticModel {
    /// Validate a spec and build the model.
    pub fn from_spec(spec: LogisticSpec) -> Result<Self, String> {
        let n = spec.features.len();
        if n == 0 {
            return Err("logistic model declares no features".to_string());
        }
        if spec.coefficients.len() != n {
            return Err(format!(
                "logistic model has {} coefficients for {n} features",
                spec.coefficients.len()
            ));
        }
        if spec.coefficients.iter().any(|c| !c.is_finite()) || !spec.intercept.is_finite() {
            return Err("logistic model has non-finite coefficients".to_string());
        }
        spec.encoders.validate()?;

        let (mean, inv_scale) = match spec.scaler {
            None => (DVector::zeros(n), DVector::from_element(n, 1.0)),
            Some(scaler) => {
                if scaler.mean.len() != n || scaler.scale.len() != n {
                    return Err(format!(
                        "scaler has {} means / {} scales for {n} features",
                        scaler.mean.len(),
                        scaler.scale.len()
                    ));
                }
                if scaler.mean.iter().any(|m| !m.is_finite()) {
                    return Err("scaler has non-finite means".to_string());
                }
                if scaler.scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                    return Err("scaler scales must be finite and > 0".to_string());
                }
                (
                    DVector::from_vec(scaler.mean),
                    DVector::from_iterator(n, scaler.scale.iter().map(|s| 1.0 / s)),
                )
            }
        };

        Ok(Self {
            name: spec.name,
            features: spec.features,
            encoders: spec.encoders,
            mean,
            inv_scale,
            coefficients: DVector::from_vec(spec.coefficients),
            intercept: spec.intercept,
        })
    }

    /// Linear score before the logistic link.
    pub fn decision_function(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let row = self.encoders.encode(&self.name, features)?;
        if row.len() != self.coefficients.len() {
            return Err(ScoreError::prediction(
                &self.name,
                format!(
                    "expected {} features, got {}",
                    self.coefficients.len(),
                    row.len()
                ),
            ));
        }
        let x = DVector::from_vec(row);
        let z = (x - &self.mean).component_mul(&self.inv_scale);
        Ok(self.intercept + self.coefficients.dot(&z))
    }
}

impl Estimator for LogisticModel {
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let z = self.decision_function(features)?;
        if !z.is_finite() {
            return Err(ScoreError::prediction(
                &self.name,
                "non-finite decision value",
            ));
        }
        Ok(sigmoid(z))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<&[String]> {
        Some(&self.features)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::FieldValue;

    fn spec() -> LogisticSpec {
        LogisticSpec {
            name: "lr".to_string(),
            features: vec!["credit_score".to_string(), "gender".to_string()],
            encoders: CategoryEncoder::new(HashMap::from([(
                "gender".to_string(),
                HashMap::from([("Female".to_string(), 0.0), ("Male".to_string(), 1.0)]),
            )])),
            scaler: Some(Scaler {
                mean: vec![600.0, 0.5],
                scale: vec![100.0, 0.5],
            }),
            coefficients: vec![2.0, -1.0],
            intercept: 0.25,
        }
    }

    fn vector(score: f64, gender: &str) -> FeatureVector {
        FeatureVector::from_parts(
            vec!["credit_score".to_string(), "gender".to_string()],
            vec![FieldValue::Number(score), FieldValue::Category(gender.to_string())],
        )
    }

    #[test]
    fn decision_function_standardizes_inputs() {
        let model = LogisticModel::from_spec(spec()).unwrap();
        // z = 0.25 + 2 * (700-600)/100 - 1 * (1-0.5)/0.5 = 0.25 + 2 - 1
        let z = model.decision_function(&vector(700.0, "Male")).unwrap();
        assert!((z - 1.25).abs() < 1e-12);

        let p = model.predict_probability(&vector(700.0, "Male")).unwrap();
        assert!((p - sigmoid(1.25)).abs() < 1e-12);
    }

    #[test]
    fn higher_credit_score_raises_probability() {
        let model = LogisticModel::from_spec(spec()).unwrap();
        let low = model.predict_probability(&vector(500.0, "Female")).unwrap();
        let high = model.predict_probability(&vector(800.0, "Female")).unwrap();
        assert!(high > low);
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut bad = spec();
        bad.coefficients.pop();
        assert!(LogisticModel::from_spec(bad).is_err());
    }

    #[test]
    fn rejects_zero_scale() {
        let mut bad = spec();
        bad.scaler = Some(Scaler {
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 0.0],
        });
        assert!(LogisticModel::from_spec(bad).unwrap_err().contains("> 0"));
    }

    #[test]
    fn unscaled_model_uses_raw_row() {
        let mut plain = spec();
        plain.scaler = None;
        let model = LogisticModel::from_spec(plain).unwrap();
        let z = model.decision_function(&vector(1.0, "Female")).unwrap();
        assert!((z - 2.25).abs() < 1e-12);
    }
}
