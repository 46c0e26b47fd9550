//! Letter grade derivation from a 0.0-4.0 grade point score.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while interpreting a grade score string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradeError {
    #[error("grade score {0:?} is not a decimal number")]
    NotADecimal(String),
    #[error("grade score {0} is outside 0.0..=4.0")]
    OutOfRange(Decimal),
    #[error("unknown grade scale {0:?} (expected \"extended\" or \"compact\")")]
    UnknownScale(String),
}

/// Threshold table mapping a score to a letter grade.
///
/// Bands use an inclusive lower bound; the first band whose bound the score
/// reaches wins. A registry picks one scale at creation and keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeScale {
    /// Ten letters from A+ down to D.
    #[default]
    Extended,
    /// A, B, C, D only.
    Compact,
}

/// (mantissa, scale, label): `Decimal::new(375, 2)` is 3.75.
const EXTENDED_BANDS: &[(i64, u32, &str)] = &[
    (400, 2, "A+"),
    (375, 2, "A"),
    (350, 2, "A-"),
    (325, 2, "B+"),
    (300, 2, "B"),
    (275, 2, "B-"),
    (250, 2, "C+"),
    (225, 2, "C"),
    (200, 2, "C-"),
];

const COMPACT_BANDS: &[(i64, u32, &str)] = &[(37, 1, "A"), (30, 1, "B"), (20, 1, "C")];

const FLOOR_LABEL: &str = "D";

impl GradeScale {
    fn bands(self) -> &'static [(i64, u32, &'static str)] {
        match self {
            GradeScale::Extended => EXTENDED_BANDS,
            GradeScale::Compact => COMPACT_BANDS,
        }
    }

    /// Letter grade for an already-parsed score.
    pub fn label_for(self, score: Decimal) -> &'static str {
        self.bands()
            .iter()
            .find(|(mantissa, scale, _)| score >= Decimal::new(*mantissa, *scale))
            .map(|(_, _, label)| *label)
            .unwrap_or(FLOOR_LABEL)
    }

    /// Parse `score` and derive its label in one step.
    pub fn derive(self, score: &str) -> Result<String, GradeError> {
        let parsed = parse_grade_score(score)?;
        Ok(self.label_for(parsed).to_string())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GradeScale::Extended => "extended",
            GradeScale::Compact => "compact",
        }
    }
}

impl fmt::Display for GradeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeScale {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extended" => Ok(GradeScale::Extended),
            "compact" => Ok(GradeScale::Compact),
            other => Err(GradeError::UnknownScale(other.to_string())),
        }
    }
}

/// Parse a grade score string such as `"3.95"`.
///
/// Accepts only finite decimals in `0.0..=4.0`.
pub fn parse_grade_score(score: &str) -> Result<Decimal, GradeError> {
    let trimmed = score.trim();
    let parsed =
        Decimal::from_str(trimmed).map_err(|_| GradeError::NotADecimal(trimmed.to_string()))?;

    if parsed < Decimal::ZERO || parsed > Decimal::new(4, 0) {
        return Err(GradeError::OutOfRange(parsed));
    }
    Ok(parsed)
}
