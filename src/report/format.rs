//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the scoring code stays clean and testable
//! - output changes are localized
//!
//! Timestamps are passed in rather than read here, so output is deterministic
//! under test.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::{BatchOutput, ScoringContext};
use crate::domain::{ScoreResult, Verdict};
use crate::error::AppError;
use crate::features::{FieldKind, InputCatalog, is_derived};
use crate::scoring::{PRIMARY_WEIGHT, SECONDARY_WEIGHT};

/// JSON report for a single score.
#[derive(Debug, Serialize)]
pub struct ScoreReport<'a> {
    pub scored_at: DateTime<Utc>,
    pub probability: f64,
    pub verdict: &'static str,
    pub verdict_code: Verdict,
    pub primary_probability: f64,
    pub secondary_probability: f64,
    pub primary_estimator: &'a str,
    pub secondary_estimator: &'a str,
}

/// Format a single score for the terminal.
pub fn format_score(result: &ScoreResult, context: &ScoringContext) -> String {
    let mut out = String::new();
    out.push_str(&format!("Payback Probability: {:.2}%\n", result.probability * 100.0));
    out.push_str(&format!("Verdict: {}\n", result.verdict.label()));
    out.push_str(&format!(
        "  {:<10} {:<24} p={:.4} (weight {:.2})\n",
        "primary",
        context.primary().name(),
        result.primary_probability,
        PRIMARY_WEIGHT
    ));
    out.push_str(&format!(
        "  {:<10} {:<24} p={:.4} (weight {:.2})\n",
        "secondary",
        context.secondary().name(),
        result.secondary_probability,
        SECONDARY_WEIGHT
    ));
    out
}

/// Serialize a single score as pretty JSON.
pub fn score_json(result: &ScoreResult, context: &ScoringContext, scored_at: DateTime<Utc>) -> Result<String, AppError> {
    let report = ScoreReport {
        scored_at,
        probability: result.probability,
        verdict: result.verdict.label(),
        verdict_code: result.verdict,
        primary_probability: result.primary_probability,
        secondary_probability: result.secondary_probability,
        primary_estimator: context.primary().name(),
        secondary_estimator: context.secondary().name(),
    };
    serde_json::to_string_pretty(&report).map_err(|e| AppError::new(4, format!("Failed to encode JSON report: {e}")))
}

/// Format the batch summary (counts, verdict breakdown, first row errors).
pub fn format_batch_summary(batch: &BatchOutput, max_errors: usize, scored_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str("=== loanrisk - batch scoring ===\n");
    out.push_str(&format!("Scored at: {}\n", scored_at.format("%Y-%m-%d %H:%M:%S UTC")));
    out.push_str(&format!(
        "Rows: read={} | valid={} | scored={} | failed={} | skipped={}\n",
        batch.rows_read,
        batch.rows.len(),
        batch.scored(),
        batch.failed(),
        batch.row_errors.len()
    ));

    out.push_str("\nVerdicts:\n");
    let scored = batch.scored();
    for verdict in Verdict::ALL {
        let n = batch.count(verdict);
        let share = if scored > 0 { n as f64 / scored as f64 * 100.0 } else { 0.0 };
        out.push_str(&format!("  {:<44} {:>6} ({share:>5.1}%)\n", verdict.label(), n));
    }

    let mut problems: Vec<(usize, Option<&str>, String)> = batch
        .row_errors
        .iter()
        .map(|e| (e.line, e.id.as_deref(), e.message.clone()))
        .chain(batch.rows.iter().filter_map(|r| {
            r.outcome
                .as_ref()
                .err()
                .map(|e| (r.line, r.id.as_deref(), e.to_string()))
        }))
        .collect();
    problems.sort_by_key(|(line, _, _)| *line);

    if !problems.is_empty() {
        out.push_str(&format!("\nProblems ({}):\n", problems.len()));
        for (line, id, message) in problems.iter().take(max_errors) {
            let id = id.map(|i| format!(" id={i}")).unwrap_or_default();
            out.push_str(&format!("  line {line}{id}: {message}\n"));
        }
        if problems.len() > max_errors {
            out.push_str(&format!("  ... {} more\n", problems.len() - max_errors));
        }
    }

    out
}

/// Format the schema and the raw-input catalog.
pub fn format_schema(context: &ScoringContext, catalog: &InputCatalog) -> String {
    let mut out = String::new();

    out.push_str(&format!("Feature schema ({} columns):\n", context.schema().len()));
    for (i, name) in context.schema().names().iter().enumerate() {
        let tag = if is_derived(name) { "derived" } else { "raw" };
        out.push_str(&format!("  {:>3}. {:<28} {tag}\n", i + 1, name));
    }

    out.push_str("\nRaw inputs:\n");
    for field in catalog.fields() {
        match &field.kind {
            FieldKind::Numeric { default } => {
                out.push_str(&format!("  {:<28} number (default {default})\n", field.name));
            }
            FieldKind::Categorical { domain } => {
                out.push_str(&format!("  {:<28} one of: {}\n", field.name, domain.join(", ")));
            }
        }
    }

    out.push_str(&format!(
        "\nEstimators: primary='{}' (x{PRIMARY_WEIGHT:.2}), secondary='{}' (x{SECONDARY_WEIGHT:.2})\n",
        context.primary().name(),
        context.secondary().name()
    ));

    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::app::pipeline::ScoredRow;
    use crate::domain::{FeatureSchema, FeatureVector};
    use crate::error::ScoreError;
    use crate::io::ingest::RowError;
    use crate::models::Estimator;

    struct Named(&'static str);

    impl Estimator for Named {
        fn predict_probability(&self, _features: &FeatureVector) -> Result<f64, ScoreError> {
            Ok(0.5)
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    fn context() -> ScoringContext {
        ScoringContext::new(
            FeatureSchema::new(["loan_amount", "gender", "credit_burden"]).unwrap(),
            Box::new(Named("lgb-v3")),
            Box::new(Named("xgb-v1")),
        )
        .unwrap()
    }

    fn result(p: f64) -> ScoreResult {
        ScoreResult {
            probability: p,
            verdict: Verdict::from_probability(p),
            primary_probability: p,
            secondary_probability: p,
        }
    }

    #[test]
    fn score_text_shows_percentage_and_verdict() {
        let text = format_score(&result(0.83), &context());
        assert!(text.starts_with("Payback Probability: 83.00%\n"));
        assert!(text.contains("Verdict: Strong candidate for approval"));
        assert!(text.contains("lgb-v3"));
        assert!(text.contains("(weight 0.35)"));
    }

    #[test]
    fn score_json_contains_timestamp_and_codes() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let json = score_json(&result(0.6), &context(), at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["scored_at"], "2026-01-02T03:04:05Z");
        assert_eq!(value["verdict"], "Moderate risk, further review needed");
        assert_eq!(value["verdict_code"], "moderate_risk");
        assert_eq!(value["secondary_estimator"], "xgb-v1");
    }

    #[test]
    fn batch_summary_counts_and_truncates_problems() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let batch = BatchOutput {
            rows: vec![
                ScoredRow {
                    line: 2,
                    id: None,
                    outcome: Ok(result(0.9)),
                },
                ScoredRow {
                    line: 4,
                    id: Some("z".to_string()),
                    outcome: Err(ScoreError::missing_field("loan_amount")),
                },
                ScoredRow {
                    line: 5,
                    id: None,
                    outcome: Ok(result(0.1)),
                },
            ],
            row_errors: vec![RowError {
                line: 3,
                id: None,
                message: "gender: 'x' is not one of [Female, Male, Other]".to_string(),
            }],
            rows_read: 4,
        };
        let text = format_batch_summary(&batch, 1, at);
        assert!(text.contains("Scored at: 2026-01-02 03:04:05 UTC"));
        assert!(text.contains("Rows: read=4 | valid=3 | scored=2 | failed=1 | skipped=1"));
        assert!(text.contains("Problems (2):"));
        assert!(text.contains("line 3: gender"));
        assert!(!text.contains("line 4"));
        assert!(text.contains("... 1 more"));
    }

    #[test]
    fn schema_listing_tags_derived_columns() {
        let ctx = context();
        let text = format_schema(&ctx, &ctx.catalog());
        assert!(text.contains("Feature schema (3 columns):"));
        assert!(text.contains("credit_burden"));
        assert!(text.contains("derived"));
        assert!(text.contains("number (default 5000)"));
        assert!(text.contains("one of: Female, Male, Other"));
    }
}
