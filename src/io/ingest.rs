//! Applicant CSV ingest.
//!
//! Turns a CSV of applicants (one per row, one column per raw field) into
//! [`RawApplicantRecord`]s ready for scoring.
//!
//! Design goals:
//! - **Strict schema**: every raw field the input catalog declares must have a column
//! - **Row-level validation**: bad rows are skipped and reported, not fatal
//! - **Deterministic**: rows keep file order

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::domain::RawApplicantRecord;
use crate::error::AppError;
use crate::features::InputCatalog;

/// Optional column carried through to exports.
pub const ID_COLUMN: &str = "id";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// One parsed applicant row.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRow {
    pub line: usize,
    pub id: Option<String>,
    pub record: RawApplicantRecord,
}

/// Ingest output: parsed rows + row errors.
#[derive(Debug, Clone)]
pub struct IngestedApplicants {
    pub rows: Vec<ApplicantRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load applicants from a CSV file.
pub fn load_applicants(path: &Path, catalog: &InputCatalog) -> Result<IngestedApplicants, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_applicants(file, catalog)
}

/// Load applicants from any CSV reader.
pub fn read_applicants<R: Read>(input: R, catalog: &InputCatalog) -> Result<IngestedApplicants, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    ensure_required_columns_exist(catalog, &header_map)?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1, records are 1-based after it.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let id = header_map
            .get(ID_COLUMN)
            .and_then(|&i| record.get(i))
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        match parse_row(&record, &header_map, catalog) {
            Ok(parsed) => rows.push(ApplicantRow {
                line,
                id,
                record: parsed,
            }),
            Err(message) => row_errors.push(RowError { line, id, message }),
        }
    }

    for err in &row_errors {
        warn!(line = err.line, id = ?err.id, "skipping row: {}", err.message);
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No valid applicant rows remain after validation."));
    }

    Ok(IngestedApplicants {
        rows,
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    catalog: &InputCatalog,
) -> Result<RawApplicantRecord, String> {
    let mut cells = Vec::with_capacity(catalog.fields().len());
    for spec in catalog.fields() {
        let idx = header_map.get(&normalize_header_name(&spec.name)).copied();
        match idx.and_then(|i| record.get(i)) {
            Some(v) if !v.is_empty() => cells.push((spec.name.as_str(), v)),
            _ => return Err(format!("{}: empty value", spec.name)),
        }
    }
    catalog.parse_record(cells).map_err(|errors| errors.join("; "))
}

fn ensure_required_columns_exist(catalog: &InputCatalog, header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = catalog
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| !header_map.contains_key(&normalize_header_name(name)))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::new(
            2,
            format!("CSV is missing required columns: {}", missing.join(", ")),
        ))
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
