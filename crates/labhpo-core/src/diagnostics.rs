//! Observational accumulator filled during classification.

use std::collections::{BTreeMap, BTreeSet};

use labhpo_model::{ClassificationOutcome, ErrorKind, LoincCode};

/// What the classifier saw that may point at reference-data gaps.
///
/// Nothing recorded here influences the classification of other records.
/// Workers classifying disjoint slices can each keep their own accumulator
/// and [`merge`](Self::merge) them at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationDiagnostics {
    fallback_failures: BTreeMap<u32, LoincCode>,
    ordinal_numeric: BTreeSet<u32>,
    rejected: BTreeMap<ErrorKind, u64>,
    accepted: u64,
}

impl ClassificationDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A quantitative test without a summary whose text did not match a fallback.
    pub fn record_fallback_failure(&mut self, test_id: u32, code: &LoincCode) {
        self.fallback_failures
            .entry(test_id)
            .or_insert_with(|| code.clone());
    }

    /// An ordinal test whose text was unparsable but which carried a number.
    pub fn record_ordinal_numeric(&mut self, test_id: u32) {
        self.ordinal_numeric.insert(test_id);
    }

    pub fn record_outcome(&mut self, outcome: &ClassificationOutcome) {
        match outcome.error_kind() {
            Some(kind) => *self.rejected.entry(kind).or_default() += 1,
            None => self.accepted += 1,
        }
    }

    pub fn merge(&mut self, other: ClassificationDiagnostics) {
        for (test_id, code) in other.fallback_failures {
            self.fallback_failures.entry(test_id).or_insert(code);
        }
        self.ordinal_numeric.extend(other.ordinal_numeric);
        for (kind, count) in other.rejected {
            *self.rejected.entry(kind).or_default() += count;
        }
        self.accepted += other.accepted;
    }

    pub fn fallback_failures(&self) -> &BTreeMap<u32, LoincCode> {
        &self.fallback_failures
    }

    pub fn ordinal_numeric(&self) -> &BTreeSet<u32> {
        &self.ordinal_numeric
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self, kind: ErrorKind) -> u64 {
        self.rejected.get(&kind).copied().unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected.values().sum::<u64>()
    }
}
