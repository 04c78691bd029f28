//! Command-line parsing for the loan risk scorer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! scoring code. Nothing here knows about estimators or formulas.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{EducationLevel, EmploymentStatus, Gender, GradeSubgrade, LoanPurpose, MaritalStatus};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "loanrisk", version, about = "Loan payback probability scorer")]
pub struct Cli {
    /// Directory holding features_list.json, primary.json and secondary.json
    /// (overrides LOAN_RISK_MODEL_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a single applicant.
    Score(ScoreArgs),
    /// Score every applicant in a CSV file.
    Batch(BatchArgs),
    /// Show the loaded feature schema and the raw inputs it needs.
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Applicant fields for `score`.
///
/// Numeric fields left unset take the input catalog defaults. Categorical
/// fields are required unless `--record` is used.
#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    /// Read the applicant from a JSON object instead of flags.
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with_all = [
            "loan_amount", "annual_income", "interest_rate", "credit_score", "debt_to_income_ratio",
            "gender", "marital_status", "education_level", "employment_status", "loan_purpose",
            "grade_subgrade", "extra",
        ]
    )]
    pub record: Option<PathBuf>,

    /// Requested loan amount.
    #[arg(long)]
    pub loan_amount: Option<f64>,

    /// Annual income.
    #[arg(long)]
    pub annual_income: Option<f64>,

    /// Interest rate in percent (e.g. 10.5).
    #[arg(long)]
    pub interest_rate: Option<f64>,

    #[arg(long)]
    pub credit_score: Option<f64>,

    /// Debt-to-income ratio as a fraction (e.g. 0.25).
    #[arg(long)]
    pub debt_to_income_ratio: Option<f64>,

    #[arg(long, value_enum, required_unless_present = "record")]
    pub gender: Option<Gender>,

    #[arg(long, value_enum, required_unless_present = "record")]
    pub marital_status: Option<MaritalStatus>,

    #[arg(long, value_enum, required_unless_present = "record")]
    pub education_level: Option<EducationLevel>,

    #[arg(long, value_enum, required_unless_present = "record")]
    pub employment_status: Option<EmploymentStatus>,

    #[arg(long, value_enum, required_unless_present = "record")]
    pub loan_purpose: Option<LoanPurpose>,

    /// Credit grade and subgrade, A1 through F5.
    #[arg(long, required_unless_present = "record")]
    pub grade_subgrade: Option<GradeSubgrade>,

    /// Additional numeric base feature declared by the schema (repeatable).
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_extra)]
    pub extra: Vec<(String, f64)>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Options for `batch`.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Applicant CSV (one column per raw field; optional `id` column).
    #[arg(long, short = 'i', value_name = "CSV")]
    pub input: PathBuf,

    /// Export per-row results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Maximum number of problem rows to list in the summary.
    #[arg(long, default_value_t = 10)]
    pub max_errors: usize,
}

fn parse_extra(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not finite", value));
    }
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("loanrisk").chain(args.iter().copied()))
    }

    const CATEGORICAL: [&str; 12] = [
        "--gender",
        "female",
        "--marital-status",
        "single",
        "--education-level",
        "masters",
        "--employment-status",
        "self-employed",
        "--loan-purpose",
        "debt-consolidation",
        "--grade-subgrade",
        "C3",
    ];

    #[test]
    fn score_with_flags() {
        let mut args = vec!["score", "--loan-amount", "12000", "--extra", "open_accounts=3"];
        args.extend(CATEGORICAL);
        let cli = parse(&args).unwrap();
        let Command::Score(score) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(score.loan_amount, Some(12_000.0));
        assert_eq!(score.annual_income, None);
        assert_eq!(score.education_level, Some(EducationLevel::Masters));
        assert_eq!(score.employment_status, Some(EmploymentStatus::SelfEmployed));
        assert_eq!(score.grade_subgrade.map(|g| g.label()), Some("C3".to_string()));
        assert_eq!(score.extra, vec![("open_accounts".to_string(), 3.0)]);
        assert_eq!(score.format, OutputFormat::Text);
    }

    #[test]
    fn score_requires_categoricals_without_record() {
        assert!(parse(&["score", "--loan-amount", "1"]).is_err());
    }

    #[test]
    fn record_conflicts_with_flags() {
        assert!(parse(&["score", "--record", "a.json"]).is_ok());
        assert!(parse(&["score", "--record", "a.json", "--gender", "male"]).is_err());
    }

    #[test]
    fn global_model_dir_after_subcommand() {
        let cli = parse(&["batch", "-i", "apps.csv", "--model-dir", "/m"]).unwrap();
        assert_eq!(cli.model_dir, Some(PathBuf::from("/m")));
    }

    #[test]
    fn extra_parser_validates() {
        assert!(parse_extra("x").is_err());
        assert!(parse_extra("=1").is_err());
        assert!(parse_extra("x=abc").is_err());
        assert!(parse_extra("x=inf").is_err());
        assert_eq!(parse_extra(" x = 2.5 ").unwrap(), ("x".to_string(), 2.5));
    }
}
