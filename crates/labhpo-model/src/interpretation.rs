//! Interpretation codes and measurement scales.
//!
//! Interpretation codes follow the FHIR observation-interpretation value set
//! used by the annotation table. Scales follow the LOINC `SCALE_TYP` axis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Present/absent reading of a single lab result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InterpretationCode {
    /// Below the normal range.
    #[serde(rename = "L")]
    Low,
    /// Above the normal range.
    #[serde(rename = "H")]
    High,
    /// Within the normal range.
    #[serde(rename = "N")]
    Normal,
    /// Ordinal test reported negative.
    #[serde(rename = "NEG")]
    Negative,
    /// Ordinal test reported positive.
    #[serde(rename = "POS")]
    Positive,
}

impl InterpretationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpretationCode::Low => "L",
            InterpretationCode::High => "H",
            InterpretationCode::Normal => "N",
            InterpretationCode::Negative => "NEG",
            InterpretationCode::Positive => "POS",
        }
    }
}

impl fmt::Display for InterpretationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpretationCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L" => Ok(InterpretationCode::Low),
            "H" => Ok(InterpretationCode::High),
            "N" => Ok(InterpretationCode::Normal),
            "NEG" => Ok(InterpretationCode::Negative),
            "POS" => Ok(InterpretationCode::Positive),
            _ => Err(ModelError::UnknownInterpretation(s.to_string())),
        }
    }
}

/// Measurement scale of a standardized test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    /// Numeric result (`Qn`).
    Quantitative,
    /// Ranked categories (`Ord`).
    Ordinal,
    /// Unordered categories (`Nom`).
    Nominal,
    /// Any other scale (`Nar`, `Doc`, `OrdQn`, ...).
    Other,
}

impl Scale {
    /// Parse a scale label. Never fails: unrecognized labels map to `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "QN" | "QUANTITATIVE" => Scale::Quantitative,
            "ORD" | "ORDINAL" => Scale::Ordinal,
            "NOM" | "NOMINAL" => Scale::Nominal,
            _ => Scale::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Quantitative => "Qn",
            Scale::Ordinal => "Ord",
            Scale::Nominal => "Nom",
            Scale::Other => "Other",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
