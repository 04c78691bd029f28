//! The estimator capability consumed by the risk scorer.

use crate::domain::FeatureVector;
use crate::error::ScoreError;

/// A trained binary classifier, treated as an opaque scoring function.
///
/// Implementations are loaded once and then shared read-only across every
/// scoring call. The `Send + Sync` bound is the reentrancy contract: an
/// implementation must tolerate concurrent `predict_probability` calls through
/// `&self` (batch scoring relies on this).
pub trait Estimator: Send + Sync {
    /// Probability of the positive class for `features`.
    ///
    /// The scorer rejects values outside `[0, 1]` and non-finite values, so an
    /// implementation should not clamp on its own.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ScoreError>;

    /// Model name/identifier, used in logs and error messages.
    fn name(&self) -> &str;

    /// Feature names (in column order) the estimator was trained on, if known.
    ///
    /// When present, the scoring context checks them against the schema at
    /// startup.
    fn expected_features(&self) -> Option<&[String]> {
        None
    }
}

/// Logistic link, written to stay finite for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
