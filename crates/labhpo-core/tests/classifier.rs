//! Tests for the lab result classifier.

mod common;

use std::collections::BTreeMap;

use common::{
    APPEARANCE, AST, CALCIUM, CRP, HCG, MALFORMED, PLATELETS_MANUAL, POTASSIUM, UNANNOTATED,
    UNMAPPED, WBC, code, dictionary, index, lab, term,
};
use labhpo_core::{
    AnnotationIndex, ClassificationDiagnostics, InterpretationRule, LabResultClassifier,
    StatisticsAggregator, TextualFallbacks,
};
use labhpo_model::{ClassificationOutcome, ErrorKind, InterpretationCode, LabSummary, RawLabResult};
use labhpo_reference::LabDictionary;

struct Fixture {
    dictionary: LabDictionary,
    index: AnnotationIndex,
    summaries: BTreeMap<u32, LabSummary>,
}

impl Fixture {
    fn new(history: &[RawLabResult]) -> Self {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.extend(history);
        Self {
            dictionary: dictionary(),
            index: index(),
            summaries: aggregator.finish(),
        }
    }

    fn classifier(&self) -> LabResultClassifier<'_, LabDictionary> {
        LabResultClassifier::new(&self.dictionary, &self.index, &self.summaries)
    }

    fn classify(&self, result: &RawLabResult) -> ClassificationOutcome {
        self.classifier()
            .classify(result, &mut ClassificationDiagnostics::new())
    }
}

fn interpretation(outcome: &ClassificationOutcome) -> Option<InterpretationCode> {
    match outcome {
        ClassificationOutcome::Accepted { interpretation, .. } => Some(*interpretation),
        ClassificationOutcome::Rejected { .. } => None,
    }
}

#[test]
fn single_point_range_classifies_same_value_as_normal() {
    let fixture = Fixture::new(&[lab(1, AST, "31", "IU/L", "")]);
    let outcome = fixture.classify(&lab(2, AST, "31", "IU/L", ""));
    assert_eq!(
        outcome,
        ClassificationOutcome::Accepted {
            row_id: 2,
            term: term("HP:0001234"),
            negated: false,
            interpretation: InterpretationCode::Normal,
        }
    );
}

#[test]
fn values_outside_range_are_low_or_high() {
    let fixture = Fixture::new(&[
        lab(1, AST, "20", "IU/L", ""),
        lab(2, AST, "40", "IU/L", ""),
    ]);
    let low = fixture.classify(&lab(3, AST, "19", "IU/L", ""));
    let high = fixture.classify(&lab(4, AST, "41", "IU/L", ""));
    assert_eq!(interpretation(&low), Some(InterpretationCode::Low));
    assert_eq!(interpretation(&high), Some(InterpretationCode::High));
}

#[test]
fn no_low_threshold_uses_flag_only() {
    let fixture = Fixture::new(&[]);
    let abnormal = fixture.classify(&lab(1, CRP, "0.1", "mg/L", "ABNORMAL"));
    assert_eq!(interpretation(&abnormal), Some(InterpretationCode::High));
    match abnormal {
        ClassificationOutcome::Accepted { term: t, negated, .. } => {
            assert_eq!(t, term("HP:0011227"));
            assert!(!negated);
        }
        other => panic!("expected accepted outcome, got {other:?}"),
    }

    let normal = fixture.classify(&lab(2, CRP, "120", "mg/L", ""));
    assert_eq!(interpretation(&normal), Some(InterpretationCode::Normal));
}

#[test]
fn no_high_threshold_maps_abnormal_to_low() {
    let fixture = Fixture::new(&[]);
    let outcome = fixture.classify(&lab(1, CALCIUM, "9.9", "mg/dL", "abnormal"));
    assert_eq!(interpretation(&outcome), Some(InterpretationCode::Low));
}

#[test]
fn rule_selection_prefers_special_cases_over_scale() {
    let index = index();
    assert_eq!(
        InterpretationRule::select(&index, &code("1988-5")),
        InterpretationRule::NoLowThreshold
    );
    assert_eq!(
        InterpretationRule::select(&index, &code("1994-3")),
        InterpretationRule::NoHighThreshold
    );
    assert_eq!(
        InterpretationRule::select(&index, &code("2823-3")),
        InterpretationRule::Quantitative
    );
    assert_eq!(
        InterpretationRule::select(&index, &code("2106-3")),
        InterpretationRule::Ordinal
    );
    assert!(matches!(
        InterpretationRule::select(&index, &code("5767-9")),
        InterpretationRule::Unsupported(_)
    ));
}

#[test]
fn ordinal_values_match_by_prefix() {
    let fixture = Fixture::new(&[]);
    let positive = fixture.classify(&lab(1, HCG, "Positive (titer 1:40)", "", ""));
    assert_eq!(interpretation(&positive), Some(InterpretationCode::Positive));
    let negative = fixture.classify(&lab(2, HCG, "NEG", "", ""));
    assert_eq!(interpretation(&negative), Some(InterpretationCode::Negative));
    assert!(matches!(
        negative,
        ClassificationOutcome::Accepted { negated: true, .. }
    ));
    let unclear = fixture.classify(&lab(3, HCG, "see comment", "", ""));
    assert_eq!(unclear.error_kind(), Some(ErrorKind::UnableToInterpret));
}

#[test]
fn ordinal_with_numeric_value_is_flagged() {
    let fixture = Fixture::new(&[lab(1, HCG, "5", "mIU/mL", "")]);
    let mut diagnostics = ClassificationDiagnostics::new();
    let outcome = fixture
        .classifier()
        .classify(&lab(2, HCG, "12", "mIU/mL", ""), &mut diagnostics);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
    assert!(diagnostics.ordinal_numeric().contains(&HCG));
}

#[test]
fn ordinal_numeric_without_summary_is_not_flagged() {
    let fixture = Fixture::new(&[]);
    let mut diagnostics = ClassificationDiagnostics::new();
    let outcome = fixture
        .classifier()
        .classify(&lab(1, HCG, "12", "mIU/mL", ""), &mut diagnostics);
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
    assert!(diagnostics.ordinal_numeric().is_empty());
}

#[test]
fn lookup_failures_reject_in_order() {
    let fixture = Fixture::new(&[]);
    let kind = |test_id| fixture.classify(&lab(1, test_id, "1", "", "")).error_kind();
    assert_eq!(kind(UNMAPPED), Some(ErrorKind::NotMapped));
    assert_eq!(kind(99_999), Some(ErrorKind::NotMapped));
    assert_eq!(kind(MALFORMED), Some(ErrorKind::MalformedCode));
    assert_eq!(kind(UNANNOTATED), Some(ErrorKind::NotAnnotated));
}

#[test]
fn non_primary_unit_is_rejected() {
    let fixture = Fixture::new(&[
        lab(1, POTASSIUM, "4.0", "mEq/L", ""),
        lab(2, POTASSIUM, "4.2", "mEq/L", ""),
        lab(3, POTASSIUM, "4.1", "mmol/L", ""),
    ]);
    let outcome = fixture.classify(&lab(4, POTASSIUM, "4.1", "mmol/L", ""));
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
    let primary = fixture.classify(&lab(5, POTASSIUM, "4.1", "MEQ/L", ""));
    assert!(primary.is_accepted());
}

#[test]
fn missing_normal_range_is_rejected() {
    let fixture = Fixture::new(&[lab(1, POTASSIUM, "7.0", "mEq/L", "abnormal")]);
    let outcome = fixture.classify(&lab(2, POTASSIUM, "4.0", "mEq/L", ""));
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
}

#[test]
fn abnormal_flag_inside_range_uses_global_mean() {
    // normal range [3.5, 5.0]; global mean (3.5 + 4.0 + 5.0 + 7.0) / 4 = 4.875
    let fixture = Fixture::new(&[
        lab(1, POTASSIUM, "3.5", "mEq/L", ""),
        lab(2, POTASSIUM, "4.0", "mEq/L", ""),
        lab(3, POTASSIUM, "5.0", "mEq/L", ""),
        lab(4, POTASSIUM, "7.0", "mEq/L", "abnormal"),
    ]);
    let below = fixture.classify(&lab(5, POTASSIUM, "4.5", "mEq/L", "abnormal"));
    assert_eq!(interpretation(&below), Some(InterpretationCode::Low));
    let above = fixture.classify(&lab(6, POTASSIUM, "4.9", "mEq/L", "abnormal"));
    assert_eq!(interpretation(&above), Some(InterpretationCode::High));
    let unflagged = fixture.classify(&lab(7, POTASSIUM, "4.5", "mEq/L", ""));
    assert_eq!(
        unflagged,
        ClassificationOutcome::Accepted {
            row_id: 7,
            term: term("HP:0011042"),
            negated: true,
            interpretation: InterpretationCode::Normal,
        }
    );
}

#[test]
fn textual_fallback_covers_unsummarized_tests() {
    let fixture = Fixture::new(&[]);
    let mut diagnostics = ClassificationDiagnostics::new();
    let classifier = fixture.classifier();

    let high = classifier.classify(&lab(1, PLATELETS_MANUAL, "HIGH", "", ""), &mut diagnostics);
    assert_eq!(interpretation(&high), Some(InterpretationCode::High));
    let rare = classifier.classify(&lab(2, PLATELETS_MANUAL, "RARE", "", ""), &mut diagnostics);
    assert_eq!(interpretation(&rare), Some(InterpretationCode::Low));
    assert!(diagnostics.fallback_failures().is_empty());

    let unknown = classifier.classify(
        &lab(3, PLATELETS_MANUAL, "see comments", "", ""),
        &mut diagnostics,
    );
    assert_eq!(unknown.error_kind(), Some(ErrorKind::UnableToInterpret));
    assert_eq!(
        diagnostics.fallback_failures().get(&PLATELETS_MANUAL),
        Some(&code("778-1"))
    );
}

#[test]
fn fallback_table_is_replaceable() {
    let fixture = Fixture::new(&[]);
    let classifier = fixture
        .classifier()
        .with_fallbacks(TextualFallbacks::empty().with_pattern(
            PLATELETS_MANUAL,
            "NORMAL",
            InterpretationCode::Normal,
        ));
    let outcome = classifier.classify(
        &lab(1, PLATELETS_MANUAL, "normal", "", ""),
        &mut ClassificationDiagnostics::new(),
    );
    assert_eq!(interpretation(&outcome), Some(InterpretationCode::Normal));
}

#[test]
fn missing_candidate_is_unrecognized_interpretation() {
    let fixture = Fixture::new(&[lab(1, WBC, "7.0", "K/uL", "")]);
    let outcome = fixture.classify(&lab(2, WBC, "7.0", "K/uL", ""));
    assert_eq!(
        outcome.error_kind(),
        Some(ErrorKind::UnrecognizedInterpretation)
    );
}

#[test]
fn nominal_scale_is_not_interpreted() {
    let fixture = Fixture::new(&[]);
    let outcome = fixture.classify(&lab(1, APPEARANCE, "Clear", "", ""));
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnableToInterpret));
}

#[test]
fn classify_all_tallies_outcomes() {
    let fixture = Fixture::new(&[lab(1, AST, "31", "IU/L", "")]);
    let batch = [
        lab(10, AST, "31", "IU/L", ""),
        lab(11, UNMAPPED, "1", "", ""),
        lab(12, APPEARANCE, "Clear", "", ""),
    ];
    let (outcomes, diagnostics) = fixture.classifier().classify_all(&batch);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(diagnostics.accepted(), 1);
    assert_eq!(diagnostics.rejected(ErrorKind::NotMapped), 1);
    assert_eq!(diagnostics.rejected(ErrorKind::UnableToInterpret), 1);
    assert_eq!(diagnostics.total(), 3);
}
