//! Export per-applicant batch results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Verdict texts contain commas, so rows go through the `csv` writer for quoting.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::ScoredRow;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    line: usize,
    id: &'a str,
    probability: Option<String>,
    primary_probability: Option<String>,
    secondary_probability: Option<String>,
    verdict: &'a str,
    error: &'a str,
}

/// Write batch results to a CSV file.
pub fn write_results_csv(path: &Path, rows: &[ScoredRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, rows)
}

/// Write batch results as CSV to any writer.
pub fn write_results<W: Write>(out: W, rows: &[ScoredRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    for row in rows {
        let (probability, primary, secondary, verdict, error) = match &row.outcome {
            Ok(r) => (
                Some(format!("{:.6}", r.probability)),
                Some(format!("{:.6}", r.primary_probability)),
                Some(format!("{:.6}", r.secondary_probability)),
                r.verdict.label(),
                String::new(),
            ),
            Err(e) => (None, None, None, "", e.to_string()),
        };
        writer
            .serialize(ExportRow {
                line: row.line,
                id: row.id.as_deref().unwrap_or(""),
                probability,
                primary_probability: primary,
                secondary_probability: secondary,
                verdict,
                error: &error,
            })
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScoreResult, Verdict};
    use crate::error::ScoreError;

    #[test]
    fn writes_header_and_quotes_verdicts() {
        let rows = vec![
            ScoredRow {
                line: 2,
                id: Some("a1".to_string()),
                outcome: Ok(ScoreResult {
                    probability: 0.6,
                    verdict: Verdict::ModerateRisk,
                    primary_probability: 0.6,
                    secondary_probability: 0.6,
                }),
            },
            ScoredRow {
                line: 3,
                id: None,
                outcome: Err(ScoreError::missing_field("credit_score")),
            },
        ];
        let mut buf = Vec::new();
        write_results(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "line,id,probability,primary_probability,secondary_probability,verdict,error"
        );
        assert_eq!(
            lines[1],
            "2,a1,0.600000,0.600000,0.600000,\"Moderate risk, further review needed\","
        );
        assert_eq!(lines[2], "3,,,,,,Missing required field 'credit_score'.");
    }
}
