//! Identifier newtypes for ontology terms and standardized test codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Ontology term identifier in `PREFIX:LOCAL` form (e.g. `HP:0001234`).
///
/// The prefix must be ASCII alphanumeric (underscores allowed) and the local
/// part must be non-empty without whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TermId {
    value: String,
    split: usize,
}

impl TermId {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let Some(split) = trimmed.find(':') else {
            return Err(ModelError::InvalidTermId(raw.to_string()));
        };
        let (prefix, local) = (&trimmed[..split], &trimmed[split + 1..]);
        let prefix_ok = !prefix.is_empty()
            && prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let local_ok = !local.is_empty() && !local.chars().any(char::is_whitespace);
        if !(prefix_ok && local_ok) {
            return Err(ModelError::InvalidTermId(raw.to_string()));
        }
        Ok(Self {
            value: trimmed.to_string(),
            split,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.value[..self.split]
    }

    pub fn local_id(&self) -> &str {
        &self.value[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for TermId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TermId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TermId> for String {
    fn from(value: TermId) -> Self {
        value.value
    }
}

/// Standardized (LOINC) test code: one to seven digits, a hyphen, and a
/// single check digit (e.g. `2345-7`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoincCode(String);

impl LoincCode {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let trimmed = raw.trim();
        let Some((number, check)) = trimmed.split_once('-') else {
            return Err(ModelError::MalformedCode(raw.to_string()));
        };
        let number_ok = (1..=7).contains(&number.len())
            && number.chars().all(|ch| ch.is_ascii_digit());
        let check_ok = check.len() == 1 && check.chars().all(|ch| ch.is_ascii_digit());
        if !(number_ok && check_ok) {
            return Err(ModelError::MalformedCode(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoincCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LoincCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LoincCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LoincCode> for String {
    fn from(value: LoincCode) -> Self {
        value.0
    }
}
