//! Decision engine: one raw lab result in, one classification outcome out.
//!
//! The steps run in a fixed order and each may reject the record:
//!
//! 1. local test id to standardized code (`NotMapped`)
//! 2. code syntax (`MalformedCode`)
//! 3. code annotated (`NotAnnotated`)
//! 4. interpretation code from the selected [`InterpretationRule`]
//!    (`UnableToInterpret`)
//! 5. candidate term for the interpretation (`UnrecognizedInterpretation`)

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use labhpo_model::{
    ClassificationOutcome, ErrorKind, InterpretationCode, LabSummary, LoincCode, NormalRange,
    RawLabResult, Scale,
};
use labhpo_reference::LabDictionary;
use regex::Regex;
use tracing::{debug, trace};

use crate::annotation::AnnotationIndex;
use crate::diagnostics::ClassificationDiagnostics;
use crate::fallback::TextualFallbacks;

static ORDINAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<neg>NORMAL$|NEG)|(?P<pos>POS))").expect("Invalid ordinal regex")
});

/// Resolves a local test id to its standardized code text.
pub trait LocalCodeLookup {
    fn standardized_code(&self, test_id: u32) -> Option<&str>;
}

impl LocalCodeLookup for LabDictionary {
    fn standardized_code(&self, test_id: u32) -> Option<&str> {
        self.code_for(test_id)
    }
}

impl LocalCodeLookup for HashMap<u32, String> {
    fn standardized_code(&self, test_id: u32) -> Option<&str> {
        self.get(&test_id).map(String::as_str)
    }
}

impl LocalCodeLookup for BTreeMap<u32, String> {
    fn standardized_code(&self, test_id: u32) -> Option<&str> {
        self.get(&test_id).map(String::as_str)
    }
}

/// The rule that produces an interpretation code for a standardized code.
///
/// Special-case membership takes precedence over the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretationRule {
    /// Quantitative, no `L` candidate: abnormal means high.
    NoLowThreshold,
    /// Quantitative, no `H` candidate: abnormal means low.
    NoHighThreshold,
    /// Compare against the normal range of the primary unit.
    Quantitative,
    /// Match the textual value against negative/positive prefixes.
    Ordinal,
    /// Nominal or unrecognized scale.
    Unsupported(Scale),
}

impl InterpretationRule {
    pub fn select(index: &AnnotationIndex, code: &LoincCode) -> Self {
        if index.no_low_threshold().contains(code) {
            return InterpretationRule::NoLowThreshold;
        }
        if index.no_high_threshold().contains(code) {
            return InterpretationRule::NoHighThreshold;
        }
        match index.scale_of(code) {
            Some(Scale::Quantitative) => InterpretationRule::Quantitative,
            Some(Scale::Ordinal) => InterpretationRule::Ordinal,
            Some(other) => InterpretationRule::Unsupported(other),
            None => InterpretationRule::Unsupported(Scale::Other),
        }
    }
}

/// Interpretation of a quantitative value against a normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantitativeReading {
    pub interpretation: InterpretationCode,
    /// True when the range said `N` but the abnormal flag forced a direction.
    pub corrected: bool,
}

/// Compare `value` with `range`; if that yields `N` for a result flagged
/// abnormal, pick the direction from the unit's global mean instead.
pub fn read_quantitative(
    value: f64,
    range: &NormalRange,
    global_mean: f64,
    flagged_abnormal: bool,
) -> QuantitativeReading {
    let interpretation = if value < range.min {
        InterpretationCode::Low
    } else if value > range.max {
        InterpretationCode::High
    } else {
        InterpretationCode::Normal
    };
    if interpretation == InterpretationCode::Normal && flagged_abnormal {
        let corrected = if value < global_mean {
            InterpretationCode::Low
        } else {
            InterpretationCode::High
        };
        return QuantitativeReading {
            interpretation: corrected,
            corrected: true,
        };
    }
    QuantitativeReading {
        interpretation,
        corrected: false,
    }
}

/// `NORMAL` or a `NEG...` prefix is negative, a `POS...` prefix is positive.
pub fn read_ordinal(value: &str) -> Option<InterpretationCode> {
    let upper = value.trim().to_uppercase();
    let captures = ORDINAL_PATTERN.captures(&upper)?;
    if captures.name("neg").is_some() {
        Some(InterpretationCode::Negative)
    } else {
        captures.name("pos").map(|_| InterpretationCode::Positive)
    }
}

/// Classifies raw lab results against shared, read-only reference data.
///
/// The classifier holds only shared references, so several workers may
/// classify in parallel; each keeps its own [`ClassificationDiagnostics`].
pub struct LabResultClassifier<'a, L: ?Sized> {
    dictionary: &'a L,
    index: &'a AnnotationIndex,
    summaries: &'a BTreeMap<u32, LabSummary>,
    fallbacks: TextualFallbacks,
}

impl<'a, L: LocalCodeLookup + ?Sized> LabResultClassifier<'a, L> {
    pub fn new(
        dictionary: &'a L,
        index: &'a AnnotationIndex,
        summaries: &'a BTreeMap<u32, LabSummary>,
    ) -> Self {
        Self {
            dictionary,
            index,
            summaries,
            fallbacks: TextualFallbacks::default(),
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: TextualFallbacks) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    pub fn classify(
        &self,
        result: &RawLabResult,
        diagnostics: &mut ClassificationDiagnostics,
    ) -> ClassificationOutcome {
        let outcome = match self.resolve(result, diagnostics) {
            Ok(outcome) => outcome,
            Err(kind) => {
                trace!(row_id = result.row_id, test_id = result.test_id, %kind, "Rejected");
                ClassificationOutcome::Rejected {
                    row_id: result.row_id,
                    kind,
                }
            }
        };
        diagnostics.record_outcome(&outcome);
        outcome
    }

    /// Classify a slice of results with a fresh diagnostics accumulator.
    pub fn classify_all<'r, I>(&self, results: I) -> (Vec<ClassificationOutcome>, ClassificationDiagnostics)
    where
        I: IntoIterator<Item = &'r RawLabResult>,
    {
        let mut diagnostics = ClassificationDiagnostics::new();
        let outcomes = results
            .into_iter()
            .map(|result| self.classify(result, &mut diagnostics))
            .collect();
        (outcomes, diagnostics)
    }

    fn resolve(
        &self,
        result: &RawLabResult,
        diagnostics: &mut ClassificationDiagnostics,
    ) -> Result<ClassificationOutcome, ErrorKind> {
        let raw_code = self
            .dictionary
            .standardized_code(result.test_id)
            .ok_or(ErrorKind::NotMapped)?;
        let code = LoincCode::parse(raw_code).map_err(|_| ErrorKind::MalformedCode)?;
        if !self.index.is_annotated(&code) {
            return Err(ErrorKind::NotAnnotated);
        }

        let interpretation = self.interpret(result, &code, diagnostics)?;
        let candidate = self
            .index
            .candidate_term(&code, interpretation)
            .ok_or(ErrorKind::UnrecognizedInterpretation)?;
        Ok(ClassificationOutcome::Accepted {
            row_id: result.row_id,
            term: candidate.term.clone(),
            negated: candidate.negated,
            interpretation,
        })
    }

    fn interpret(
        &self,
        result: &RawLabResult,
        code: &LoincCode,
        diagnostics: &mut ClassificationDiagnostics,
    ) -> Result<InterpretationCode, ErrorKind> {
        let abnormal = result.is_flagged_abnormal();
        match InterpretationRule::select(self.index, code) {
            InterpretationRule::NoLowThreshold => Ok(if abnormal {
                InterpretationCode::High
            } else {
                InterpretationCode::Normal
            }),
            InterpretationRule::NoHighThreshold => Ok(if abnormal {
                InterpretationCode::Low
            } else {
                InterpretationCode::Normal
            }),
            InterpretationRule::Quantitative => self.interpret_quantitative(result, code, diagnostics),
            InterpretationRule::Ordinal => match read_ordinal(&result.value) {
                Some(interpretation) => Ok(interpretation),
                None => {
                    // Only tests seen by the aggregator are reported.
                    if result.numeric_value().is_some()
                        && self.summaries.contains_key(&result.test_id)
                    {
                        debug!(test_id = result.test_id, row_id = result.row_id, "Ordinal result with numeric value");
                        diagnostics.record_ordinal_numeric(result.test_id);
                    }
                    Err(ErrorKind::UnableToInterpret)
                }
            },
            InterpretationRule::Unsupported(_) => Err(ErrorKind::UnableToInterpret),
        }
    }

    fn interpret_quantitative(
        &self,
        result: &RawLabResult,
        code: &LoincCode,
        diagnostics: &mut ClassificationDiagnostics,
    ) -> Result<InterpretationCode, ErrorKind> {
        let Some(summary) = self.summaries.get(&result.test_id) else {
            return self
                .fallbacks
                .interpret(result.test_id, &result.value)
                .ok_or_else(|| {
                    diagnostics.record_fallback_failure(result.test_id, code);
                    ErrorKind::UnableToInterpret
                });
        };
        let primary = summary
            .primary_unit()
            .ok_or(ErrorKind::UnableToInterpret)?;
        if result.unit != primary.unit {
            return Err(ErrorKind::UnableToInterpret);
        }
        let Some(range) = primary.normal_range.as_ref() else {
            debug!(test_id = result.test_id, unit = %primary.unit, "No normal range for primary unit");
            return Err(ErrorKind::UnableToInterpret);
        };
        let value = result
            .numeric_value()
            .ok_or(ErrorKind::UnableToInterpret)?;
        let reading = read_quantitative(value, range, primary.mean, result.is_flagged_abnormal());
        if reading.corrected {
            trace!(row_id = result.row_id, interpretation = %reading.interpretation, "Abnormal flag overrode normal range");
        }
        Ok(reading.interpretation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> NormalRange {
        NormalRange {
            count: 2,
            min,
            mean: (min + max) / 2.0,
            max,
        }
    }

    #[test]
    fn quantitative_reading_compares_against_bounds() {
        let r = range(10.0, 20.0);
        assert_eq!(read_quantitative(9.9, &r, 15.0, false).interpretation, InterpretationCode::Low);
        assert_eq!(read_quantitative(20.1, &r, 15.0, false).interpretation, InterpretationCode::High);
        assert_eq!(read_quantitative(10.0, &r, 15.0, false).interpretation, InterpretationCode::Normal);
        assert_eq!(read_quantitative(20.0, &r, 15.0, false).interpretation, InterpretationCode::Normal);
    }

    #[test]
    fn abnormal_flag_corrects_normal_by_global_mean() {
        let r = range(10.0, 20.0);
        let low = read_quantitative(12.0, &r, 16.0, true);
        assert_eq!(low.interpretation, InterpretationCode::Low);
        assert!(low.corrected);
        let high = read_quantitative(16.0, &r, 16.0, true);
        assert_eq!(high.interpretation, InterpretationCode::High);
        assert!(high.corrected);
        let out_of_range = read_quantitative(25.0, &r, 16.0, true);
        assert_eq!(out_of_range.interpretation, InterpretationCode::High);
        assert!(!out_of_range.corrected);
    }

    #[test]
    fn ordinal_prefixes() {
        assert_eq!(read_ordinal("Positive (titer 1:40)"), Some(InterpretationCode::Positive));
        assert_eq!(read_ordinal("POS"), Some(InterpretationCode::Positive));
        assert_eq!(read_ordinal("neg"), Some(InterpretationCode::Negative));
        assert_eq!(read_ordinal(" Negative "), Some(InterpretationCode::Negative));
        assert_eq!(read_ordinal("NORMAL"), Some(InterpretationCode::Negative));
        assert_eq!(read_ordinal("see comment"), None);
        assert_eq!(read_ordinal("NORMAL FLORA"), None);
        assert_eq!(read_ordinal(""), None);
    }
}
