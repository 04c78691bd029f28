//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves artifact locations (flags, environment, `.env`)
//! - loads the scoring context once
//! - dispatches to the single / batch / schema handlers

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::Utc;
use clap::Parser;

use crate::app::pipeline::ScoringContext;
use crate::cli::{BatchArgs, Cli, Command, OutputFormat, ScoreArgs};
use crate::domain::{ApplicantInput, ModelPaths, RawApplicantRecord};
use crate::error::AppError;
use crate::features::{
    ANNUAL_INCOME, CREDIT_SCORE, DEBT_TO_INCOME_RATIO, FieldSpec, INTEREST_RATE, InputCatalog, LOAN_AMOUNT,
};

pub mod pipeline;

/// Entry point for the `loanrisk` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let paths = ModelPaths::resolve(cli.model_dir.as_deref());
    let context = ScoringContext::load(&paths)?;

    match cli.command {
        Command::Score(args) => handle_score(&context, args),
        Command::Batch(args) => handle_batch(&context, args),
        Command::Schema => handle_schema(&context),
    }
}

fn handle_score(context: &ScoringContext, args: ScoreArgs) -> Result<(), AppError> {
    let record = match &args.record {
        Some(path) => read_record_json(path, &context.catalog())?,
        None => record_from_args(&args, &context.catalog())?,
    };

    let result = context.score(&record)?;

    match args.format {
        OutputFormat::Text => print!("{}", crate::report::format_score(&result, context)),
        OutputFormat::Json => println!("{}", crate::report::score_json(&result, context, Utc::now())?),
    }
    Ok(())
}

fn handle_batch(context: &ScoringContext, args: BatchArgs) -> Result<(), AppError> {
    let ingested = crate::io::load_applicants(&args.input, &context.catalog())?;
    let batch = pipeline::run_batch(context, ingested);

    print!(
        "{}",
        crate::report::format_batch_summary(&batch, args.max_errors, Utc::now())
    );

    if let Some(path) = &args.export {
        crate::io::write_results_csv(path, &batch.rows)?;
    }
    Ok(())
}

fn handle_schema(context: &ScoringContext) -> Result<(), AppError> {
    print!("{}", crate::report::format_schema(context, &context.catalog()));
    Ok(())
}

/// Read a raw applicant record from a JSON object file.
///
/// Values are validated through the input catalog like CSV cells. The file
/// must be complete: no defaults are filled in.
pub fn read_record_json(path: &Path, catalog: &InputCatalog) -> Result<RawApplicantRecord, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open record JSON '{}': {e}", path.display())))?;
    read_record(BufReader::new(file), catalog)
        .map_err(|e| AppError::new(e.exit_code(), format!("{} ({})", e.message(), path.display())))
}

/// Parse and validate a JSON applicant record from any reader.
pub fn read_record<R: Read>(reader: R, catalog: &InputCatalog) -> Result<RawApplicantRecord, AppError> {
    let record: RawApplicantRecord =
        serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid record JSON: {e}")))?;
    catalog
        .canonicalize_record(&record)
        .map_err(|errors| AppError::new(2, format!("Invalid record: {}", errors.join("; "))))
}

/// Build a record from `score` flags.
///
/// Unset numeric flags take the catalog defaults; schema base features not
/// covered by flags or `--extra` take their catalog defaults too.
pub fn record_from_args(args: &ScoreArgs, catalog: &InputCatalog) -> Result<RawApplicantRecord, AppError> {
    let required = |name: &str| AppError::new(2, format!("--{} is required", name.replace('_', "-")));

    let input = ApplicantInput {
        loan_amount: args.loan_amount.unwrap_or_else(|| numeric_default(LOAN_AMOUNT)),
        annual_income: args.annual_income.unwrap_or_else(|| numeric_default(ANNUAL_INCOME)),
        interest_rate: args.interest_rate.unwrap_or_else(|| numeric_default(INTEREST_RATE)),
        credit_score: args.credit_score.unwrap_or_else(|| numeric_default(CREDIT_SCORE)),
        debt_to_income_ratio: args
            .debt_to_income_ratio
            .unwrap_or_else(|| numeric_default(DEBT_TO_INCOME_RATIO)),
        gender: args.gender.ok_or_else(|| required("gender"))?,
        marital_status: args.marital_status.ok_or_else(|| required("marital_status"))?,
        education_level: args.education_level.ok_or_else(|| required("education_level"))?,
        employment_status: args.employment_status.ok_or_else(|| required("employment_status"))?,
        loan_purpose: args.loan_purpose.ok_or_else(|| required("loan_purpose"))?,
        grade_subgrade: args.grade_subgrade.ok_or_else(|| required("grade_subgrade"))?,
        extra: args.extra.iter().cloned().collect(),
    };

    let mut record = RawApplicantRecord::from(&input);
    catalog.fill_defaults(&mut record);
    Ok(record)
}

fn numeric_default(name: &str) -> f64 {
    FieldSpec::for_name(name)
        .default_value()
        .and_then(|v| v.as_number())
        .unwrap_or(crate::features::GENERIC_NUMERIC_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EducationLevel, EmploymentStatus, FeatureSchema, FieldValue, Gender, LoanPurpose, MaritalStatus,
    };

    fn args() -> ScoreArgs {
        ScoreArgs {
            record: None,
            loan_amount: Some(10_000.0),
            annual_income: None,
            interest_rate: None,
            credit_score: None,
            debt_to_income_ratio: None,
            gender: Some(Gender::Male),
            marital_status: Some(MaritalStatus::Divorced),
            education_level: Some(EducationLevel::Phd),
            employment_status: Some(EmploymentStatus::Retired),
            loan_purpose: Some(LoanPurpose::Medical),
            grade_subgrade: Some("A4".parse().unwrap()),
            extra: vec![("open_accounts".to_string(), 4.0)],
            format: OutputFormat::Text,
        }
    }

    fn catalog() -> InputCatalog {
        InputCatalog::for_schema(
            &FeatureSchema::new(["loan_amount", "annual_income", "open_accounts", "years_employed", "gender"])
                .unwrap(),
        )
    }

    #[test]
    fn unset_numeric_flags_take_defaults() {
        let record = record_from_args(&args(), &catalog()).unwrap();
        assert_eq!(record.get("loan_amount"), Some(&FieldValue::Number(10_000.0)));
        assert_eq!(record.get("annual_income"), Some(&FieldValue::Number(5000.0)));
        assert_eq!(record.get("interest_rate"), Some(&FieldValue::Number(10.0)));
        assert_eq!(record.get("credit_score"), Some(&FieldValue::Number(600.0)));
        assert_eq!(record.get("debt_to_income_ratio"), Some(&FieldValue::Number(0.1)));
        assert_eq!(record.get("open_accounts"), Some(&FieldValue::Number(4.0)));
        assert_eq!(record.get("years_employed"), Some(&FieldValue::Number(1.0)));
        assert_eq!(record.get("education_level"), Some(&FieldValue::Category("PhD".to_string())));
        assert_eq!(record.get("grade_subgrade"), Some(&FieldValue::Category("A4".to_string())));
    }

    #[test]
    fn missing_categorical_is_reported_as_flag() {
        let mut a = args();
        a.loan_purpose = None;
        let err = record_from_args(&a, &catalog()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "--loan-purpose is required");
    }

    #[test]
    fn missing_record_file_is_config_error() {
        let err = read_record_json(Path::new("/no/such/record.json"), &catalog()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn record_json_labels_are_canonicalized() {
        let json = r#"{"loan_amount": 10000, "annual_income": "50000", "gender": "male"}"#;
        let record = read_record(json.as_bytes(), &catalog()).unwrap();
        assert_eq!(record.get("gender"), Some(&FieldValue::Category("Male".to_string())));
        assert_eq!(record.get("annual_income"), Some(&FieldValue::Number(50_000.0)));
        assert!(!record.contains("years_employed"));
    }

    #[test]
    fn record_json_out_of_domain_label_is_input_error() {
        let json = r#"{"loan_amount": 10000, "gender": "Robot"}"#;
        let err = read_record(json.as_bytes(), &catalog()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("gender: 'Robot' is not one of [Female, Male, Other]"));
    }

    #[test]
    fn record_json_scores_with_bundled_models() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let context = ScoringContext::load(&ModelPaths::in_dir(&dir)).unwrap();
        let json = r#"{
            "loan_amount": 10000, "annual_income": 50000, "interest_rate": 10,
            "credit_score": 700, "debt_to_income_ratio": 0.2,
            "gender": "male", "marital_status": "single", "education_level": "bachelor's",
            "employment_status": "employed", "loan_purpose": "car", "grade_subgrade": "b2"
        }"#;
        let record = read_record(json.as_bytes(), &context.catalog()).unwrap();
        assert!(context.score(&record).is_ok());

        let bad = json.replace("\"b2\"", "\"Z9\"");
        assert_eq!(read_record(bad.as_bytes(), &context.catalog()).unwrap_err().exit_code(), 2);
    }
}
