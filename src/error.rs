//! Error types.
//!
//! Two layers:
//!
//! - [`ScoreError`]: typed failures of the scoring core (derivation, schema
//!   assembly, estimator invocation). Callers can match on the variant.
//! - [`AppError`]: what the binary reports. Carries a process exit code and a
//!   display-ready message.
//!
//! Exit codes:
//! - `2`: configuration / input problems
//! - `3`: no usable data, or schema drift between artifacts and input
//! - `4`: prediction failures

use thiserror::Error;

/// Failures raised by the feature deriver and the risk scorer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// A raw field needed by a derived-feature formula is absent.
    #[error("Missing required field '{field}'.")]
    MissingField { field: String },

    /// A formula field is present but cannot be used as a number.
    #[error("Invalid value for field '{field}': {reason}.")]
    InvalidField { field: String, reason: String },

    /// The assembled feature set does not line up with the declared schema.
    #[error("Feature schema mismatch: {}", describe_mismatch(.missing, .duplicated, .detail))]
    SchemaMismatch {
        missing: Vec<String>,
        duplicated: Vec<String>,
        detail: Option<String>,
    },

    /// An estimator failed or produced an unusable probability.
    #[error("Error in prediction ({estimator}): {message}")]
    Prediction { estimator: String, message: String },
}

impl ScoreError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn prediction(estimator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Prediction {
            estimator: estimator.into(),
            message: message.into(),
        }
    }

    /// Schema drift with a free-form explanation and no per-name details.
    pub fn schema_detail(detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            missing: Vec::new(),
            duplicated: Vec::new(),
            detail: Some(detail.into()),
        }
    }

    /// Exit code used when this error reaches the binary boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScoreError::MissingField { .. } | ScoreError::InvalidField { .. } => 2,
            ScoreError::SchemaMismatch { .. } => 3,
            ScoreError::Prediction { .. } => 4,
        }
    }
}

fn describe_mismatch(missing: &[String], duplicated: &[String], detail: &Option<String>) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing [{}]", missing.join(", ")));
    }
    if !duplicated.is_empty() {
        parts.push(format!("duplicated [{}]", duplicated.join(", ")));
    }
    if let Some(detail) = detail {
        parts.push(detail.clone());
    }
    if parts.is_empty() {
        "unspecified".to_string()
    } else {
        parts.join("; ")
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ScoreError> for AppError {
    fn from(err: ScoreError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
