//! Shared scoring pipeline used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! artifacts -> context -> raw record -> feature vector -> blended score
//!
//! The command handlers can then focus on presentation (text vs JSON vs CSV).

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{FeatureSchema, FeatureVector, ModelPaths, RawApplicantRecord, ScoreResult, Verdict};
use crate::error::{AppError, ScoreError};
use crate::features::{InputCatalog, build_feature_vector};
use crate::io::ingest::{IngestedApplicants, RowError};
use crate::io::{load_estimator, load_schema};
use crate::models::Estimator;
use crate::scoring::{EstimatorRole, score_vector};

/// Immutable scoring state: the schema plus both estimators.
///
/// Built once at startup and shared by reference afterwards. Scoring is a
/// pure function of `(context, record)`.
pub struct ScoringContext {
    schema: FeatureSchema,
    primary: Box<dyn Estimator>,
    secondary: Box<dyn Estimator>,
}

impl ScoringContext {
    /// Assemble a context from parts.
    ///
    /// Estimators that declare their training features must declare exactly
    /// the schema (same names, same order).
    pub fn new(
        schema: FeatureSchema,
        primary: Box<dyn Estimator>,
        secondary: Box<dyn Estimator>,
    ) -> Result<Self, ScoreError> {
        check_estimator_features(EstimatorRole::Primary, primary.as_ref(), &schema)?;
        check_estimator_features(EstimatorRole::Secondary, secondary.as_ref(), &schema)?;
        Ok(Self {
            schema,
            primary,
            secondary,
        })
    }

    /// Load schema and estimators from disk.
    ///
    /// Any failure here is fatal to startup.
    pub fn load(paths: &ModelPaths) -> Result<Self, AppError> {
        let schema = load_schema(&paths.schema)?;
        let primary = load_estimator(&paths.primary)?;
        let secondary = load_estimator(&paths.secondary)?;
        let context = Self::new(schema, primary, secondary)?;
        info!(
            features = context.schema.len(),
            primary = context.primary.name(),
            secondary = context.secondary.name(),
            "scoring context ready"
        );
        Ok(context)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn primary(&self) -> &dyn Estimator {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> &dyn Estimator {
        self.secondary.as_ref()
    }

    /// Raw input fields this context needs.
    pub fn catalog(&self) -> InputCatalog {
        InputCatalog::for_schema(&self.schema)
    }

    /// Derive and assemble the feature vector for a record.
    pub fn derive(&self, record: &RawApplicantRecord) -> Result<FeatureVector, ScoreError> {
        build_feature_vector(record, &self.schema)
    }

    /// Full pipeline for one record.
    pub fn score(&self, record: &RawApplicantRecord) -> Result<ScoreResult, ScoreError> {
        let features = self.derive(record)?;
        score_vector(&features, self.primary.as_ref(), self.secondary.as_ref())
    }
}

fn check_estimator_features(
    role: EstimatorRole,
    estimator: &dyn Estimator,
    schema: &FeatureSchema,
) -> Result<(), ScoreError> {
    let Some(expected) = estimator.expected_features() else {
        return Ok(());
    };
    if expected == schema.names() {
        return Ok(());
    }

    let missing: Vec<String> = schema
        .names()
        .iter()
        .filter(|n| !expected.contains(n))
        .cloned()
        .collect();
    let extra: Vec<&str> = expected
        .iter()
        .filter(|n| !schema.contains(n))
        .map(String::as_str)
        .collect();

    let mut detail = format!(
        "{} estimator '{}' was trained on a different feature list",
        role.label(),
        estimator.name()
    );
    if !extra.is_empty() {
        detail.push_str(&format!(" (unknown to schema: {})", extra.join(", ")));
    }
    if missing.is_empty() && extra.is_empty() {
        detail.push_str(" (same names, different order)");
    }

    Err(ScoreError::SchemaMismatch {
        missing,
        duplicated: Vec::new(),
        detail: Some(detail),
    })
}

/// One scored batch row (success or per-row failure).
#[derive(Debug, Clone)]
pub struct ScoredRow {
    pub line: usize,
    pub id: Option<String>,
    pub outcome: Result<ScoreResult, ScoreError>,
}

/// All outputs of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub rows: Vec<ScoredRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl BatchOutput {
    pub fn scored(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.scored()
    }

    /// Number of successfully scored rows with the given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(s) if s.verdict == verdict))
            .count()
    }
}

/// Score every ingested row against the shared context.
///
/// Rows are independent, so they are scored on the rayon pool; output keeps
/// input order. A failing row is recorded and does not stop the batch.
pub fn run_batch(context: &ScoringContext, ingested: IngestedApplicants) -> BatchOutput {
    let rows: Vec<ScoredRow> = ingested
        .rows
        .into_par_iter()
        .map(|row| {
            let outcome = context.score(&row.record);
            ScoredRow {
                line: row.line,
                id: row.id,
                outcome,
            }
        })
        .collect();

    for row in &rows {
        if let Err(e) = &row.outcome {
            warn!(line = row.line, id = ?row.id, "scoring failed: {e}");
        }
    }

    BatchOutput {
        rows,
        row_errors: ingested.row_errors,
        rows_read: ingested.rows_read,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;
    use crate::io::ingest::ApplicantRow;

    /// Probability rises with credit score; declares a fixed feature list.
    struct CreditScoreModel {
        features: Vec<String>,
    }

    impl Estimator for CreditScoreModel {
        fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
            let score = features
                .get("credit_score")
                .and_then(FieldValue::as_number)
                .ok_or_else(|| ScoreError::prediction("cs", "no credit_score"))?;
            Ok((score / 1000.0).clamp(0.0, 1.0))
        }

        fn name(&self) -> &str {
            "cs"
        }

        fn expected_features(&self) -> Option<&[String]> {
            Some(&self.features)
        }
    }

    struct Constant(f64);

    impl Estimator for Constant {
        fn predict_probability(&self, _features: &FeatureVector) -> Result<f64, ScoreError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    fn schema_names() -> Vec<String> {
        [
            "loan_amount",
            "annual_income",
            "interest_rate",
            "credit_score",
            "debt_to_income_ratio",
            "gender",
            "loan_to_income_ratio",
            "credit_burden",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn record() -> RawApplicantRecord {
        RawApplicantRecord::new()
            .with("loan_amount", 10_000.0)
            .with("annual_income", 50_000.0)
            .with("interest_rate", 10.0)
            .with("credit_score", 700.0)
            .with("debt_to_income_ratio", 0.2)
            .with("gender", "Male")
    }

    fn context(p_primary: f64, p_secondary: f64) -> ScoringContext {
        ScoringContext::new(
            FeatureSchema::new(schema_names()).unwrap(),
            Box::new(Constant(p_primary)),
            Box::new(Constant(p_secondary)),
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_strong_candidate() {
        let ctx = context(0.9, 0.7);
        let features = ctx.derive(&record()).unwrap();
        let lti = features.get("loan_to_income_ratio").and_then(FieldValue::as_number).unwrap();
        assert!((lti - 10_000.0 / 50_001.0).abs() < 1e-15);

        let result = ctx.score(&record()).unwrap();
        assert!((result.probability - 0.83).abs() < 1e-12);
        assert_eq!(result.verdict, Verdict::StrongCandidate);
    }

    #[test]
    fn missing_credit_score_fails_before_scoring() {
        let ctx = context(0.9, 0.7);
        let mut r = record();
        r.remove("credit_score");
        assert_eq!(ctx.score(&r).unwrap_err(), ScoreError::missing_field("credit_score"));
    }

    #[test]
    fn context_accepts_matching_estimator_features() {
        let primary = CreditScoreModel {
            features: schema_names(),
        };
        let ctx = ScoringContext::new(
            FeatureSchema::new(schema_names()).unwrap(),
            Box::new(primary),
            Box::new(Constant(0.5)),
        )
        .unwrap();
        let result = ctx.score(&record()).unwrap();
        // 0.65 * 0.7 + 0.35 * 0.5
        assert!((result.probability - 0.63).abs() < 1e-12);
        assert_eq!(result.verdict, Verdict::ModerateRisk);
    }

    #[test]
    fn context_rejects_reordered_estimator_features() {
        let mut reordered = schema_names();
        reordered.swap(0, 1);
        let err = ScoringContext::new(
            FeatureSchema::new(schema_names()).unwrap(),
            Box::new(Constant(0.5)),
            Box::new(CreditScoreModel { features: reordered }),
        )
        .err()
        .unwrap();
        let text = err.to_string();
        assert!(text.contains("secondary estimator 'cs'"));
        assert!(text.contains("different order"));
    }

    #[test]
    fn context_rejects_estimator_with_unknown_features() {
        let mut features = schema_names();
        features.pop();
        features.push("employment_years".to_string());
        let err = ScoringContext::new(
            FeatureSchema::new(schema_names()).unwrap(),
            Box::new(CreditScoreModel { features }),
            Box::new(Constant(0.5)),
        )
        .err()
        .unwrap();
        match err {
            ScoreError::SchemaMismatch { missing, detail, .. } => {
                assert_eq!(missing, vec!["credit_burden".to_string()]);
                assert!(detail.unwrap().contains("employment_years"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bundled_artifacts_load_and_score() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let ctx = ScoringContext::load(&ModelPaths::in_dir(&dir)).unwrap();
        assert_eq!(ctx.schema().len(), 18);
        assert_eq!(ctx.catalog().fields().len(), 11);

        let record = record()
            .with("marital_status", "Single")
            .with("education_level", "Bachelor's")
            .with("employment_status", "Employed")
            .with("loan_purpose", "Debt consolidation")
            .with("grade_subgrade", "B2");
        let result = ctx.score(&record).unwrap();
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(result.verdict, Verdict::from_probability(result.probability));
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let ctx = context(0.2, 0.4);
        let mut broken = record();
        broken.remove("annual_income");
        let rows: Vec<ApplicantRow> = (0..50)
            .map(|i| ApplicantRow {
                line: i + 2,
                id: Some(format!("app-{i}")),
                record: if i == 7 { broken.clone() } else { record() },
            })
            .collect();
        let ingested = IngestedApplicants {
            rows,
            row_errors: vec![RowError {
                line: 60,
                id: None,
                message: "bad".to_string(),
            }],
            rows_read: 51,
        };

        let out = run_batch(&ctx, ingested);
        assert_eq!(out.rows.len(), 50);
        assert!(out.rows.iter().enumerate().all(|(i, r)| r.line == i + 2));
        assert_eq!(out.scored(), 49);
        assert_eq!(out.failed(), 1);
        assert_eq!(out.count(Verdict::HighRisk), 49);
        assert_eq!(
            out.rows[7].outcome.as_ref().unwrap_err(),
            &ScoreError::missing_field("annual_income")
        );
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.rows_read, 51);
    }
}
