//! Immutable index over annotation and scale reference data.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use labhpo_model::{CandidateTerm, InterpretationCode, LoincCode, Scale};
use labhpo_reference::{AnnotationRecord, ScaleTable};
use tracing::{info, warn};

use crate::error::CoreError;

/// Candidate terms per standardized code, plus the quantitative special-case
/// sets derived from them.
///
/// A quantitative code without an `L` candidate belongs to the no-low set
/// ("lower is always acceptable"); without an `H` candidate it belongs to
/// the no-high set.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    candidates: HashMap<LoincCode, BTreeMap<InterpretationCode, CandidateTerm>>,
    scales: HashMap<LoincCode, Scale>,
    no_low: BTreeSet<LoincCode>,
    no_high: BTreeSet<LoincCode>,
}

impl AnnotationIndex {
    /// Build the index. Fails if any annotated code lacks a scale entry.
    pub fn build<I>(records: I, scale_table: &ScaleTable) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = AnnotationRecord>,
    {
        let mut candidates: HashMap<LoincCode, BTreeMap<InterpretationCode, CandidateTerm>> =
            HashMap::new();
        for record in records {
            let terms = candidates.entry(record.code.clone()).or_default();
            if terms.contains_key(&record.interpretation) {
                warn!(
                    code = %record.code,
                    interpretation = %record.interpretation,
                    "Duplicate annotation ignored"
                );
                continue;
            }
            terms.insert(
                record.interpretation,
                CandidateTerm {
                    term: record.term,
                    negated: record.negated,
                },
            );
        }

        let mut scales = HashMap::with_capacity(candidates.len());
        let mut no_low = BTreeSet::new();
        let mut no_high = BTreeSet::new();
        for (code, terms) in &candidates {
            let scale = scale_table
                .scale_of(code)
                .ok_or_else(|| CoreError::MissingScale { code: code.clone() })?;
            scales.insert(code.clone(), scale);
            if scale == Scale::Quantitative {
                if !terms.contains_key(&InterpretationCode::Low) {
                    no_low.insert(code.clone());
                }
                if !terms.contains_key(&InterpretationCode::High) {
                    no_high.insert(code.clone());
                }
            }
        }

        info!(
            codes = candidates.len(),
            no_low = no_low.len(),
            no_high = no_high.len(),
            "Built annotation index"
        );
        Ok(Self {
            candidates,
            scales,
            no_low,
            no_high,
        })
    }

    pub fn is_annotated(&self, code: &LoincCode) -> bool {
        self.candidates.contains_key(code)
    }

    pub fn scale_of(&self, code: &LoincCode) -> Option<Scale> {
        self.scales.get(code).copied()
    }

    pub fn candidate_term(
        &self,
        code: &LoincCode,
        interpretation: InterpretationCode,
    ) -> Option<&CandidateTerm> {
        self.candidates.get(code)?.get(&interpretation)
    }

    pub fn no_low_threshold(&self) -> &BTreeSet<LoincCode> {
        &self.no_low
    }

    pub fn no_high_threshold(&self) -> &BTreeSet<LoincCode> {
        &self.no_high
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
