//! Probability blending and verdict mapping.
//!
//! Rules:
//! 1. Each estimator must return a finite probability in `[0, 1]`; anything
//!    else is a prediction error (no pre-blend clamping).
//! 2. `combined = 0.65 * p_primary + 0.35 * p_secondary` (fixed weights).
//! 3. `combined` is clipped into `[0, 1]`.
//! 4. Verdict thresholds: `> 0.8` strong, `(0.5, 0.8]` moderate, `<= 0.5` high risk.

use tracing::debug;

use crate::domain::{FeatureVector, ScoreResult, Verdict};
use crate::error::ScoreError;
use crate::models::Estimator;

/// Weight of the primary estimator.
pub const PRIMARY_WEIGHT: f64 = 0.65;
/// Weight of the secondary estimator.
pub const SECONDARY_WEIGHT: f64 = 0.35;

/// Above this the applicant is a strong candidate.
pub const STRONG_THRESHOLD: f64 = 0.8;
/// Above this (and up to `STRONG_THRESHOLD`) the applicant needs review.
pub const MODERATE_THRESHOLD: f64 = 0.5;

/// Which of the two estimators produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorRole {
    Primary,
    Secondary,
}

impl EstimatorRole {
    pub fn label(self) -> &'static str {
        match self {
            EstimatorRole::Primary => "primary",
            EstimatorRole::Secondary => "secondary",
        }
    }
}

/// Weighted blend of the two probabilities (no clipping).
pub fn blend(p_primary: f64, p_secondary: f64) -> f64 {
    PRIMARY_WEIGHT * p_primary + SECONDARY_WEIGHT * p_secondary
}

/// Clamp a blended value into `[0, 1]`.
pub fn clip_probability(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

impl Verdict {
    /// Map a clipped probability to its verdict.
    pub fn from_probability(p: f64) -> Verdict {
        if p > STRONG_THRESHOLD {
            Verdict::StrongCandidate
        } else if p > MODERATE_THRESHOLD {
            Verdict::ModerateRisk
        } else {
            Verdict::HighRisk
        }
    }
}

/// Reject estimator outputs that are not a finite probability.
pub fn check_probability(role: EstimatorRole, estimator: &dyn Estimator, p: f64) -> Result<f64, ScoreError> {
    if !p.is_finite() {
        return Err(ScoreError::prediction(
            format!("{} estimator '{}'", role.label(), estimator.name()),
            format!("returned non-finite value {p}"),
        ));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(ScoreError::prediction(
            format!("{} estimator '{}'", role.label(), estimator.name()),
            format!("returned {p}, outside [0, 1]"),
        ));
    }
    Ok(p)
}

/// Blend two validated probabilities into a final result.
pub fn combine(p_primary: f64, p_secondary: f64) -> ScoreResult {
    let probability = clip_probability(blend(p_primary, p_secondary));
    ScoreResult {
        probability,
        verdict: Verdict::from_probability(probability),
        primary_probability: p_primary,
        secondary_probability: p_secondary,
    }
}

/// Score a feature vector against both estimators.
///
/// Each estimator is called exactly once; the first failure is returned as is.
pub fn score_vector(
    features: &FeatureVector,
    primary: &dyn Estimator,
    secondary: &dyn Estimator,
) -> Result<ScoreResult, ScoreError> {
    let p_primary = invoke(EstimatorRole::Primary, primary, features)?;
    let p_secondary = invoke(EstimatorRole::Secondary, secondary, features)?;

    let result = combine(p_primary, p_secondary);
    debug!(
        p_primary,
        p_secondary,
        probability = result.probability,
        verdict = result.verdict.label(),
        "scored"
    );
    Ok(result)
}

fn invoke(role: EstimatorRole, estimator: &dyn Estimator, features: &FeatureVector) -> Result<f64, ScoreError> {
    let p = estimator
        .predict_probability(features)
        .map_err(|err| match err {
            ScoreError::Prediction { estimator: name, message } => ScoreError::prediction(
                format!("{} estimator '{name}'", role.label()),
                message,
            ),
            other => other,
        })?;
    check_probability(role, estimator, p)
}
