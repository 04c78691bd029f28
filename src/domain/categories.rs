//! Categorical input domains.
//!
//! Each categorical applicant field has a fixed set of labels. The label text
//! is what the estimators' encoders are keyed on, so it must match the
//! training data exactly (including apostrophes and capitalisation).

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Declares a categorical enum with its canonical labels.
///
/// Generates `ALL`, `label()`, `Display`, and a case-insensitive `FromStr`
/// that accepts either the label or the CLI value name.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident => $field:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Raw field name this category fills.
            pub const FIELD: &'static str = $field;

            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const LABELS: &'static [&'static str] = &[$($label),+];

            /// Canonical label as seen by the estimators.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                for value in Self::ALL {
                    let cli_name = value
                        .to_possible_value()
                        .map(|v| v.get_name().to_string())
                        .unwrap_or_default();
                    if value.label().eq_ignore_ascii_case(wanted) || cli_name.eq_ignore_ascii_case(wanted) {
                        return Ok(*value);
                    }
                }
                Err(format!(
                    "'{wanted}' is not a valid {} (expected one of: {})",
                    Self::FIELD,
                    Self::LABELS.join(", ")
                ))
            }
        }
    };
}

categorical! {
    /// Applicant gender.
    Gender => "gender" {
        Female => "Female",
        Male => "Male",
        Other => "Other",
    }
}

categorical! {
    MaritalStatus => "marital_status" {
        Single => "Single",
        Married => "Married",
        Divorced => "Divorced",
        Widowed => "Widowed",
    }
}

categorical! {
    /// Highest completed education.
    EducationLevel => "education_level" {
        HighSchool => "High School",
        Masters => "Master's",
        Bachelors => "Bachelor's",
        Phd => "PhD",
        Other => "Other",
    }
}

categorical! {
    EmploymentStatus => "employment_status" {
        SelfEmployed => "Self-employed",
        Employed => "Employed",
        Unemployed => "Unemployed",
        Retired => "Retired",
        Student => "Student",
    }
}

categorical! {
    /// What the loan is for.
    LoanPurpose => "loan_purpose" {
        Other => "Other",
        DebtConsolidation => "Debt consolidation",
        Home => "Home",
        Education => "Education",
        Vacation => "Vacation",
        Car => "Car",
        Medical => "Medical",
        Business => "Business",
    }
}

/// Credit grade letter (A best, F worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub const ALL: [Grade; 6] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E, Grade::F];

    fn letter(self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::E => 'E',
            Grade::F => 'F',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        Grade::ALL
            .into_iter()
            .find(|g| g.letter() == c.to_ascii_uppercase())
    }
}

/// Combined grade + subgrade (`A1` .. `F5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GradeSubgrade {
    grade: Grade,
    subgrade: u8,
}

impl GradeSubgrade {
    pub const FIELD: &'static str = "grade_subgrade";

    pub fn new(grade: Grade, subgrade: u8) -> Option<Self> {
        (1..=5)
            .contains(&subgrade)
            .then_some(Self { grade, subgrade })
    }

    /// Every valid value, `A1` first.
    pub fn all() -> Vec<GradeSubgrade> {
        Grade::ALL
            .into_iter()
            .flat_map(|grade| (1..=5).map(move |subgrade| GradeSubgrade { grade, subgrade }))
            .collect()
    }

    pub fn label(self) -> String {
        format!("{}{}", self.grade.letter(), self.subgrade)
    }
}

impl fmt::Display for GradeSubgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.grade.letter(), self.subgrade)
    }
}

impl FromStr for GradeSubgrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || format!("'{raw}' is not a valid grade_subgrade (expected A1..F5)");

        let mut chars = raw.chars();
        let (Some(letter), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(invalid());
        };
        let grade = Grade::from_letter(letter).ok_or_else(invalid)?;
        let subgrade = digit
            .to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(invalid)?;
        GradeSubgrade::new(grade, subgrade).ok_or_else(invalid)
    }
}
