//! Classification outcomes and the persisted mapping rows derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::ids::TermId;
use crate::interpretation::InterpretationCode;

/// Per-record, non-fatal reasons a result could not be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Local test id has no standardized code.
    NotMapped,
    /// Standardized code fails syntactic validation.
    MalformedCode,
    /// Standardized code has no reference annotation.
    NotAnnotated,
    /// No interpretation code was produced but one was expected.
    UnrecognizedInterpretation,
    /// No classification rule produced an interpretation code.
    UnableToInterpret,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::NotMapped,
        ErrorKind::MalformedCode,
        ErrorKind::NotAnnotated,
        ErrorKind::UnrecognizedInterpretation,
        ErrorKind::UnableToInterpret,
    ];

    /// Stable numeric code written to the direct-mapping table.
    pub fn code(&self) -> u8 {
        match self {
            ErrorKind::NotMapped => 1,
            ErrorKind::MalformedCode => 2,
            ErrorKind::NotAnnotated => 3,
            ErrorKind::UnrecognizedInterpretation => 4,
            ErrorKind::UnableToInterpret => 5,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::NotMapped => "local id not mapped to loinc",
            ErrorKind::MalformedCode => "malformed loinc id",
            ErrorKind::NotAnnotated => "loinc code not annotated",
            ErrorKind::UnrecognizedInterpretation => "interpretation code not mapped to hpo",
            ErrorKind::UnableToInterpret => "unable to interpret",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotMapped => "NotMapped",
            ErrorKind::MalformedCode => "MalformedCode",
            ErrorKind::NotAnnotated => "NotAnnotated",
            ErrorKind::UnrecognizedInterpretation => "UnrecognizedInterpretation",
            ErrorKind::UnableToInterpret => "UnableToInterpret",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR {}: {}", self.code(), self.message())
    }
}

impl FromStr for ErrorKind {
    type Err = ModelError;

    /// Parse the persisted `ERROR n: message` form (the message is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .strip_prefix("ERROR ")
            .and_then(|rest| rest.split(':').next())
            .and_then(|code| code.trim().parse::<u8>().ok());
        code.and_then(|code| ErrorKind::ALL.into_iter().find(|kind| kind.code() == code))
            .ok_or_else(|| ModelError::UnknownErrorKind(s.to_string()))
    }
}

/// Candidate phenotype term for one (code, interpretation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateTerm {
    pub term: TermId,
    /// True when the term records absence of the finding.
    pub negated: bool,
}

/// Result of classifying one raw lab result.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Accepted {
        row_id: u64,
        term: TermId,
        negated: bool,
        interpretation: InterpretationCode,
    },
    Rejected {
        row_id: u64,
        kind: ErrorKind,
    },
}

impl ClassificationOutcome {
    pub fn row_id(&self) -> u64 {
        match self {
            ClassificationOutcome::Accepted { row_id, .. }
            | ClassificationOutcome::Rejected { row_id, .. } => *row_id,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ClassificationOutcome::Accepted { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ClassificationOutcome::Rejected { kind, .. } => Some(*kind),
            ClassificationOutcome::Accepted { .. } => None,
        }
    }
}

/// Negation column of the direct-mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NegationFlag {
    #[serde(rename = "T")]
    Negated,
    #[serde(rename = "F")]
    Present,
    /// The record was rejected; the mapping column carries an error string.
    #[serde(rename = "U")]
    Unknown,
}

impl NegationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegationFlag::Negated => "T",
            NegationFlag::Present => "F",
            NegationFlag::Unknown => "U",
        }
    }
}

impl fmt::Display for NegationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NegationFlag {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "T" => Ok(NegationFlag::Negated),
            "F" => Ok(NegationFlag::Present),
            "U" => Ok(NegationFlag::Unknown),
            _ => Err(ModelError::UnknownNegation(s.to_string())),
        }
    }
}

/// One row of the direct-mapping table.
///
/// `map_to` holds a term id for accepted rows and an `ERROR n: ...` string
/// for rejected rows. It stays a plain string so rows read back from storage
/// can carry malformed ids without failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMapping {
    #[serde(rename = "ROW_ID")]
    pub row_id: u64,
    #[serde(rename = "NEGATED")]
    pub negated: NegationFlag,
    #[serde(rename = "MAP_TO")]
    pub map_to: String,
}

impl DirectMapping {
    /// True for accepted, non-negated rows: the only rows that feed the closure.
    pub fn is_present_finding(&self) -> bool {
        self.negated == NegationFlag::Present
    }
}

impl From<&ClassificationOutcome> for DirectMapping {
    fn from(outcome: &ClassificationOutcome) -> Self {
        match outcome {
            ClassificationOutcome::Accepted {
                row_id,
                term,
                negated,
                ..
            } => DirectMapping {
                row_id: *row_id,
                negated: if *negated {
                    NegationFlag::Negated
                } else {
                    NegationFlag::Present
                },
                map_to: term.to_string(),
            },
            ClassificationOutcome::Rejected { row_id, kind } => DirectMapping {
                row_id: *row_id,
                negated: NegationFlag::Unknown,
                map_to: kind.to_string(),
            },
        }
    }
}

/// One row of the closure table: an ancestor implied by a direct mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InferredMapping {
    #[serde(rename = "SOURCE_ROW_ID")]
    pub source_row_id: u64,
    #[serde(rename = "INFERRED_TO")]
    pub ancestor: TermId,
}
