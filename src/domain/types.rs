//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from CLI flags, JSON record files or CSV rows
//! - passed through derivation and scoring without copying estimator state
//! - exported to JSON/CSV

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::categories::{
    EducationLevel, EmploymentStatus, Gender, GradeSubgrade, LoanPurpose, MaritalStatus,
};
use crate::error::ScoreError;

/// A single raw or derived field value.
///
/// Numeric fields are `Number`; categorical fields carry their canonical label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Category(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Category(label) => Some(label),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Category(label) => f.write_str(label),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Category(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Category(value)
    }
}

/// Raw applicant record: field name -> value.
///
/// Categorical values are expected to be pre-validated by the input boundary;
/// the scoring core only does numeric derivation on top of this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawApplicantRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for RawApplicantRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Typed applicant input.
///
/// This is the fully-declared form of a record: every required numeric and
/// categorical field is a struct member, so an `ApplicantInput` can never be
/// missing one. Extra numeric base features (declared by the schema but not
/// known here) go in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantInput {
    pub loan_amount: f64,
    pub annual_income: f64,
    pub interest_rate: f64,
    pub credit_score: f64,
    pub debt_to_income_ratio: f64,

    pub gender: Gender,
    pub marital_status: MaritalStatus,
    pub education_level: EducationLevel,
    pub employment_status: EmploymentStatus,
    pub loan_purpose: LoanPurpose,
    pub grade_subgrade: GradeSubgrade,

    pub extra: BTreeMap<String, f64>,
}

impl From<&ApplicantInput> for RawApplicantRecord {
    fn from(input: &ApplicantInput) -> Self {
        let mut record = RawApplicantRecord::new()
            .with("loan_amount", input.loan_amount)
            .with("annual_income", input.annual_income)
            .with("interest_rate", input.interest_rate)
            .with("credit_score", input.credit_score)
            .with("debt_to_income_ratio", input.debt_to_income_ratio)
            .with(Gender::FIELD, input.gender.label())
            .with(MaritalStatus::FIELD, input.marital_status.label())
            .with(EducationLevel::FIELD, input.education_level.label())
            .with(EmploymentStatus::FIELD, input.employment_status.label())
            .with(LoanPurpose::FIELD, input.loan_purpose.label())
            .with(GradeSubgrade::FIELD, input.grade_subgrade.label());
        for (name, value) in &input.extra {
            record.insert(name.clone(), *value);
        }
        record
    }
}

/// Ordered list of feature names the estimators were trained on.
///
/// Names are unique; order is the column order every estimator expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Validate and build a schema.
    ///
    /// Rejects empty schemas and duplicated names.
    pub fn new<I, S>(names: I) -> Result<Self, ScoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ScoreError::schema_detail("schema declares no features"));
        }

        let mut seen = HashSet::new();
        let mut duplicated = Vec::new();
        for name in &names {
            if !seen.insert(name.as_str()) && !duplicated.contains(name) {
                duplicated.push(name.clone());
            }
        }
        if !duplicated.is_empty() {
            return Err(ScoreError::SchemaMismatch {
                missing: Vec::new(),
                duplicated,
                detail: None,
            });
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl<'de> Deserialize<'de> for FeatureSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        FeatureSchema::new(names).map_err(serde::de::Error::custom)
    }
}

/// The model input: values selected and ordered exactly per a [`FeatureSchema`].
///
/// Only the feature deriver builds these, so the name set always equals the
/// schema it was assembled against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<FieldValue>,
}

impl FeatureVector {
    pub(crate) fn from_parts(names: Vec<String>, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Discrete risk category derived from the blended probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    StrongCandidate,
    ModerateRisk,
    HighRisk,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [Verdict::StrongCandidate, Verdict::ModerateRisk, Verdict::HighRisk];

    /// Human-facing verdict text.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::StrongCandidate => "Strong candidate for approval",
            Verdict::ModerateRisk => "Moderate risk, further review needed",
            Verdict::HighRisk => "High risk of default, rejection recommended",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of a single scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Blended, clipped payback probability in `[0, 1]`.
    pub probability: f64,
    pub verdict: Verdict,
    pub primary_probability: f64,
    pub secondary_probability: f64,
}

/// Where the scoring artifacts live.
///
/// Resolved once at startup from flags, environment and `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub schema: PathBuf,
    pub primary: PathBuf,
    pub secondary: PathBuf,
}
