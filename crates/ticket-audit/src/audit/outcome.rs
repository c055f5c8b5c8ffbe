use std::fmt;

use serde::{Serialize, Serializer};

use super::config::ScoringPolicy;

pub const MISSING_COLUMN_LABEL: &str = "Fail - Missing Column";

/// Result of one rule for one ticket.
///
/// Only `Pass` and `Fail` take part in scoring; every other outcome is contextual and
/// travels through to the verdict table as its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    MissingColumn,
    Label(String),
}

impl Outcome {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }

    /// Plain `Pass`/`Fail` labels collapse to their scoring variants.
    pub fn label(value: impl Into<String>) -> Self {
        let value = value.into();
        match value.as_str() {
            "Pass" => Outcome::Pass,
            "Fail" => Outcome::Fail,
            MISSING_COLUMN_LABEL => Outcome::MissingColumn,
            _ => Outcome::Label(value),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Pass => "Pass",
            Outcome::Fail => "Fail",
            Outcome::MissingColumn => MISSING_COLUMN_LABEL,
            Outcome::Label(label) => label,
        }
    }

    /// Any verdict whose label begins with "fail", regardless of case.
    pub fn is_failure(&self) -> bool {
        self.as_str()
            .trim_start()
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("fail"))
    }

    /// `Some(passed)` when the verdict counts toward a score under `policy`.
    pub fn scoring_value(&self, policy: &ScoringPolicy) -> Option<bool> {
        match self {
            Outcome::Pass => Some(true),
            Outcome::Fail => Some(false),
            Outcome::MissingColumn if policy.missing_column_counts_as_fail => Some(false),
            Outcome::MissingColumn | Outcome::Label(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
