//! Derived features and feature-vector assembly.
//!
//! The formulas below must match what the estimators were trained on, down to
//! the `+ 1` / `1 +` offsets in the denominators. Those offsets keep the ratios
//! finite when income, credit score or debt ratio are zero.
//!
//! | feature | formula |
//! |---|---|
//! | `loan_to_income_ratio` | `loan_amount / (annual_income + 1)` |
//! | `interest_burden` | `loan_amount * interest_rate / 100` |
//! | `credit_utilization` | `loan_amount / (credit_score + 1)` |
//! | `income_per_debt_ratio` | `annual_income * (1 - debt_to_income_ratio)` |
//! | `income_minus_loan` | `annual_income - loan_amount` |
//! | `loan_income_interaction` | `loan_amount * loan_to_income_ratio` |
//! | `credit_burden` | `credit_score / (1 + debt_to_income_ratio)` |

use serde::Serialize;
use tracing::debug;

use crate::domain::{FeatureSchema, FeatureVector, FieldValue, RawApplicantRecord};
use crate::error::ScoreError;

pub const LOAN_AMOUNT: &str = "loan_amount";
pub const ANNUAL_INCOME: &str = "annual_income";
pub const INTEREST_RATE: &str = "interest_rate";
pub const CREDIT_SCORE: &str = "credit_score";
pub const DEBT_TO_INCOME_RATIO: &str = "debt_to_income_ratio";

/// Raw numeric fields read by the formulas, in lookup order.
pub const FORMULA_INPUTS: [&str; 5] = [
    LOAN_AMOUNT,
    ANNUAL_INCOME,
    INTEREST_RATE,
    CREDIT_SCORE,
    DEBT_TO_INCOME_RATIO,
];

/// Names of the derived features, in computation order.
pub const DERIVED_FEATURE_NAMES: [&str; 7] = [
    "loan_to_income_ratio",
    "interest_burden",
    "credit_utilization",
    "income_per_debt_ratio",
    "income_minus_loan",
    "loan_income_interaction",
    "credit_burden",
];

/// True if `name` is one of the seven derived features.
pub fn is_derived(name: &str) -> bool {
    DERIVED_FEATURE_NAMES.contains(&name)
}

/// The numeric inputs every formula draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaInputs {
    pub loan_amount: f64,
    pub annual_income: f64,
    pub interest_rate: f64,
    pub credit_score: f64,
    pub debt_to_income_ratio: f64,
}

impl FormulaInputs {
    /// Read the formula inputs from a raw record.
    ///
    /// The first absent field (in [`FORMULA_INPUTS`] order) is reported as
    /// `MissingField`. Categorical or non-finite values are `InvalidField`.
    pub fn from_record(record: &RawApplicantRecord) -> Result<Self, ScoreError> {
        Ok(Self {
            loan_amount: numeric_field(record, LOAN_AMOUNT)?,
            annual_income: numeric_field(record, ANNUAL_INCOME)?,
            interest_rate: numeric_field(record, INTEREST_RATE)?,
            credit_score: numeric_field(record, CREDIT_SCORE)?,
            debt_to_income_ratio: numeric_field(record, DEBT_TO_INCOME_RATIO)?,
        })
    }
}

fn numeric_field(record: &RawApplicantRecord, name: &str) -> Result<f64, ScoreError> {
    match record.get(name) {
        None => Err(ScoreError::missing_field(name)),
        Some(FieldValue::Category(label)) => Err(ScoreError::invalid_field(
            name,
            format!("expected a number, got '{label}'"),
        )),
        Some(FieldValue::Number(v)) if !v.is_finite() => {
            Err(ScoreError::invalid_field(name, format!("non-finite value {v}")))
        }
        Some(FieldValue::Number(v)) => Ok(*v),
    }
}

/// The seven engineered features for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFeatures {
    pub loan_to_income_ratio: f64,
    pub interest_burden: f64,
    pub credit_utilization: f64,
    pub income_per_debt_ratio: f64,
    pub income_minus_loan: f64,
    pub loan_income_interaction: f64,
    pub credit_burden: f64,
}

impl DerivedFeatures {
    /// Apply the formulas, in table order.
    pub fn from_inputs(x: &FormulaInputs) -> Self {
        let loan_to_income_ratio = x.loan_amount / (x.annual_income + 1.0);
        let interest_burden = x.loan_amount * x.interest_rate / 100.0;
        let credit_utilization = x.loan_amount / (x.credit_score + 1.0);
        let income_per_debt_ratio = x.annual_income * (1.0 - x.debt_to_income_ratio);
        let income_minus_loan = x.annual_income - x.loan_amount;
        let loan_income_interaction = x.loan_amount * loan_to_income_ratio;
        let credit_burden = x.credit_score / (1.0 + x.debt_to_income_ratio);

        Self {
            loan_to_income_ratio,
            interest_burden,
            credit_utilization,
            income_per_debt_ratio,
            income_minus_loan,
            loan_income_interaction,
            credit_burden,
        }
    }

    /// Read the formula inputs from `record` and compute all seven features.
    pub fn compute(record: &RawApplicantRecord) -> Result<Self, ScoreError> {
        let inputs = FormulaInputs::from_record(record)?;
        Ok(Self::from_inputs(&inputs))
    }

    /// `(name, value)` pairs in [`DERIVED_FEATURE_NAMES`] order.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            (DERIVED_FEATURE_NAMES[0], self.loan_to_income_ratio),
            (DERIVED_FEATURE_NAMES[1], self.interest_burden),
            (DERIVED_FEATURE_NAMES[2], self.credit_utilization),
            (DERIVED_FEATURE_NAMES[3], self.income_per_debt_ratio),
            (DERIVED_FEATURE_NAMES[4], self.income_minus_loan),
            (DERIVED_FEATURE_NAMES[5], self.loan_income_interaction),
            (DERIVED_FEATURE_NAMES[6], self.credit_burden),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }
}

/// Derive features for `record` and assemble them in `schema` order.
///
/// Derived values always come from `record` itself; a raw field that happens
/// to share a derived name is shadowed by the freshly computed value.
///
/// Raw fields the schema does not list are dropped. Any schema name that is
/// neither derived nor present in `record` makes the whole assembly fail with
/// `SchemaMismatch`, listing every absent name.
pub fn build_feature_vector(
    record: &RawApplicantRecord,
    schema: &FeatureSchema,
) -> Result<FeatureVector, ScoreError> {
    let derived = DerivedFeatures::compute(record)?;
    debug!(
        loan_to_income_ratio = derived.loan_to_income_ratio,
        interest_burden = derived.interest_burden,
        credit_utilization = derived.credit_utilization,
        income_per_debt_ratio = derived.income_per_debt_ratio,
        income_minus_loan = derived.income_minus_loan,
        loan_income_interaction = derived.loan_income_interaction,
        credit_burden = derived.credit_burden,
        "derived features"
    );

    let mut values = Vec::with_capacity(schema.len());
    let mut missing = Vec::new();

    for name in schema.names() {
        if let Some(v) = derived.get(name) {
            values.push(FieldValue::Number(v));
        } else if let Some(v) = record.get(name) {
            values.push(v.clone());
        } else {
            missing.push(name.clone());
        }
    }

    if !missing.is_empty() {
        return Err(ScoreError::SchemaMismatch {
            missing,
            duplicated: Vec::new(),
            detail: None,
        });
    }

    Ok(FeatureVector::from_parts(schema.names().to_vec(), values))
}
