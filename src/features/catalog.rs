//! Typed declaration of the raw input fields a schema needs.
//!
//! Input boundaries (CLI flags, CSV rows) use the catalog to turn text into a
//! [`RawApplicantRecord`]. Field kinds come from an exact-name table; nothing
//! is inferred from substrings of feature names.

use serde::Serialize;

use crate::domain::{
    EducationLevel, EmploymentStatus, FeatureSchema, FieldValue, Gender, GradeSubgrade, LoanPurpose, MaritalStatus,
    RawApplicantRecord,
};
use crate::features::derive::{
    ANNUAL_INCOME, CREDIT_SCORE, DEBT_TO_INCOME_RATIO, INTEREST_RATE, LOAN_AMOUNT, is_derived,
};

/// Default for numeric base features without a dedicated entry.
pub const GENERIC_NUMERIC_DEFAULT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Numeric { default: f64 },
    Categorical { domain: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Look up the declared kind for a raw field name.
    pub fn for_name(name: &str) -> Self {
        let kind = match name {
            LOAN_AMOUNT | ANNUAL_INCOME => FieldKind::Numeric { default: 5000.0 },
            INTEREST_RATE => FieldKind::Numeric { default: 10.0 },
            DEBT_TO_INCOME_RATIO => FieldKind::Numeric { default: 0.1 },
            CREDIT_SCORE => FieldKind::Numeric { default: 600.0 },
            Gender::FIELD => categorical(Gender::LABELS),
            MaritalStatus::FIELD => categorical(MaritalStatus::LABELS),
            EducationLevel::FIELD => categorical(EducationLevel::LABELS),
            EmploymentStatus::FIELD => categorical(EmploymentStatus::LABELS),
            LoanPurpose::FIELD => categorical(LoanPurpose::LABELS),
            GradeSubgrade::FIELD => FieldKind::Categorical {
                domain: GradeSubgrade::all().into_iter().map(GradeSubgrade::label).collect(),
            },
            _ => FieldKind::Numeric {
                default: GENERIC_NUMERIC_DEFAULT,
            },
        };
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// Parse a textual value for this field.
    ///
    /// Categorical values are matched case-insensitively and stored with the
    /// canonical label. Numeric values must be finite.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, String> {
        let raw = raw.trim();
        match &self.kind {
            FieldKind::Numeric { .. } => {
                let v: f64 = raw
                    .parse()
                    .map_err(|_| format!("{}: '{raw}' is not a number", self.name))?;
                if !v.is_finite() {
                    return Err(format!("{}: '{raw}' is not finite", self.name));
                }
                Ok(FieldValue::Number(v))
            }
            FieldKind::Categorical { domain } => domain
                .iter()
                .find(|label| label.eq_ignore_ascii_case(raw))
                .map(|label| FieldValue::Category(label.clone()))
                .ok_or_else(|| {
                    format!(
                        "{}: '{raw}' is not one of [{}]",
                        self.name,
                        domain.join(", ")
                    )
                }),
        }
    }

    /// Re-check an already typed value (e.g. from a JSON record).
    ///
    /// Text goes through [`FieldSpec::parse`], so categorical labels are
    /// canonicalized and numeric-looking strings become numbers.
    pub fn canonicalize(&self, value: &FieldValue) -> Result<FieldValue, String> {
        match (&self.kind, value) {
            (_, FieldValue::Category(raw)) => self.parse(raw),
            (FieldKind::Numeric { .. }, FieldValue::Number(v)) if v.is_finite() => Ok(FieldValue::Number(*v)),
            (FieldKind::Numeric { .. }, FieldValue::Number(v)) => Err(format!("{}: '{v}' is not finite", self.name)),
            (FieldKind::Categorical { domain }, FieldValue::Number(v)) => Err(format!(
                "{}: expected one of [{}], got number {v}",
                self.name,
                domain.join(", ")
            )),
        }
    }

    pub fn default_value(&self) -> Option<FieldValue> {
        match &self.kind {
            FieldKind::Numeric { default } => Some(FieldValue::Number(*default)),
            FieldKind::Categorical { .. } => None,
        }
    }
}

fn categorical(labels: &[&str]) -> FieldKind {
    FieldKind::Categorical {
        domain: labels.iter().map(|s| s.to_string()).collect(),
    }
}

/// Every raw field a schema requires, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputCatalog {
    fields: Vec<FieldSpec>,
}

impl InputCatalog {
    /// Raw fields = schema names minus the derived features.
    pub fn for_schema(schema: &FeatureSchema) -> Self {
        let fields = schema
            .names()
            .iter()
            .filter(|name| !is_derived(name))
            .map(|name| FieldSpec::for_name(name))
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build a record from `(name, text)` pairs.
    ///
    /// Names the catalog does not declare are ignored. Returns every field
    /// error at once so a whole row can be reported.
    pub fn parse_record<'a, I>(&self, values: I) -> Result<RawApplicantRecord, Vec<String>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = RawApplicantRecord::new();
        let mut errors = Vec::new();
        for (name, raw) in values {
            let Some(spec) = self.get(name) else {
                continue;
            };
            match spec.parse(raw) {
                Ok(value) => record.insert(name, value),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() { Ok(record) } else { Err(errors) }
    }

    /// Validate a typed record against the catalog.
    ///
    /// Declared fields are canonicalized; other fields pass through untouched
    /// (formula inputs the schema does not list are still needed). Returns
    /// every field error at once.
    pub fn canonicalize_record(&self, record: &RawApplicantRecord) -> Result<RawApplicantRecord, Vec<String>> {
        let mut out = RawApplicantRecord::new();
        let mut errors = Vec::new();
        for (name, value) in record.iter() {
            let checked = match self.get(name) {
                Some(spec) => spec.canonicalize(value),
                None => Ok(value.clone()),
            };
            match checked {
                Ok(value) => out.insert(name, value),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() { Ok(out) } else { Err(errors) }
    }

    /// Fill absent numeric fields with their defaults.
    pub fn fill_defaults(&self, record: &mut RawApplicantRecord) {
        for spec in &self.fields {
            if record.contains(&spec.name) {
                continue;
            }
            if let Some(value) = spec.default_value() {
                record.insert(spec.name.clone(), value);
            }
        }
    }
}
