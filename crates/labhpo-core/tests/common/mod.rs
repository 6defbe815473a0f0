//! Shared reference fixtures for labhpo-core integration tests.

#![allow(dead_code)]

use labhpo_core::AnnotationIndex;
use labhpo_model::{InterpretationCode, LoincCode, RawLabResult, Scale, TermId, normalize_unit};
use labhpo_ontology::OntologyGraph;
use labhpo_reference::{AnnotationRecord, LabDictionary, ScaleTable};

pub const AST: u32 = 50878;
pub const POTASSIUM: u32 = 50971;
pub const CRP: u32 = 50889;
pub const CALCIUM: u32 = 50808;
pub const HCG: u32 = 51000;
pub const PLATELETS_MANUAL: u32 = 51266;
pub const APPEARANCE: u32 = 51508;
pub const WBC: u32 = 51301;
pub const UNMAPPED: u32 = 50000;
pub const MALFORMED: u32 = 50001;
pub const UNANNOTATED: u32 = 50002;

pub fn term(raw: &str) -> TermId {
    TermId::parse(raw).expect("valid term id")
}

pub fn code(raw: &str) -> LoincCode {
    LoincCode::parse(raw).expect("valid code")
}

pub fn dictionary() -> LabDictionary {
    LabDictionary::from_codes([
        (AST, "1920-8"),
        (POTASSIUM, "2823-3"),
        (CRP, "1988-5"),
        (CALCIUM, "1994-3"),
        (HCG, "2106-3"),
        (PLATELETS_MANUAL, "778-1"),
        (APPEARANCE, "5767-9"),
        (WBC, "6690-2"),
        (UNMAPPED, ""),
        (MALFORMED, "LOINC-X"),
        (UNANNOTATED, "1234-5"),
    ])
}

pub fn scales() -> ScaleTable {
    [
        ("1920-8", Scale::Quantitative),
        ("2823-3", Scale::Quantitative),
        ("1988-5", Scale::Quantitative),
        ("1994-3", Scale::Quantitative),
        ("2106-3", Scale::Ordinal),
        ("778-1", Scale::Quantitative),
        ("5767-9", Scale::Nominal),
        ("6690-2", Scale::Quantitative),
        ("1234-5", Scale::Quantitative),
    ]
    .into_iter()
    .map(|(raw, scale)| (code(raw), scale))
    .collect()
}

fn annotation(
    raw_code: &str,
    interpretation: InterpretationCode,
    raw_term: &str,
    negated: bool,
) -> AnnotationRecord {
    AnnotationRecord {
        code: code(raw_code),
        interpretation,
        term: term(raw_term),
        negated,
    }
}

pub fn annotations() -> Vec<AnnotationRecord> {
    use labhpo_model::InterpretationCode::{High, Low, Negative, Normal, Positive};
    vec![
        annotation("1920-8", Low, "HP:0031965", false),
        annotation("1920-8", Normal, "HP:0001234", false),
        annotation("1920-8", High, "HP:0031964", false),
        annotation("2823-3", Low, "HP:0002900", false),
        annotation("2823-3", Normal, "HP:0011042", true),
        annotation("2823-3", High, "HP:0002153", false),
        // no low threshold: lower is always acceptable
        annotation("1988-5", Normal, "HP:0011227", true),
        annotation("1988-5", High, "HP:0011227", false),
        // no high threshold
        annotation("1994-3", Low, "HP:0002901", false),
        annotation("1994-3", Normal, "HP:0004363", true),
        annotation("2106-3", Negative, "HP:0031867", true),
        annotation("2106-3", Positive, "HP:0031867", false),
        annotation("778-1", Low, "HP:0001873", false),
        annotation("778-1", Normal, "HP:0011873", true),
        annotation("778-1", High, "HP:0001894", false),
        annotation("5767-9", Positive, "HP:0012085", false),
        annotation("6690-2", Low, "HP:0001882", false),
        annotation("6690-2", High, "HP:0001974", false),
    ]
}

pub fn index() -> AnnotationIndex {
    AnnotationIndex::build(annotations(), &scales()).expect("annotation index")
}

/// Small hierarchy rooted at HP:0000001. HP:0001234 has exactly three
/// strict ancestors.
pub fn ontology() -> OntologyGraph {
    let mut graph = OntologyGraph::new();
    let edges = [
        ("HP:0000118", "HP:0000001"),
        ("HP:0001939", "HP:0000118"),
        ("HP:0001871", "HP:0000118"),
        ("HP:0001234", "HP:0001939"),
        ("HP:0011042", "HP:0001939"),
        ("HP:0002153", "HP:0011042"),
        ("HP:0002900", "HP:0011042"),
        ("HP:0001873", "HP:0001871"),
        ("HP:0001894", "HP:0001871"),
        ("HP:0011873", "HP:0001871"),
        ("HP:0031964", "HP:0001939"),
        ("HP:0031965", "HP:0001939"),
        ("HP:0011227", "HP:0000118"),
    ];
    for (child, parent) in edges {
        graph.add_is_a(term(child), term(parent));
    }
    graph
}

pub fn lab(row_id: u64, test_id: u32, value: &str, unit: &str, flag: &str) -> RawLabResult {
    RawLabResult {
        row_id,
        subject_id: 1,
        admission_id: None,
        test_id,
        charted_at: None,
        value: value.to_string(),
        value_num: value.trim().parse().ok(),
        unit: normalize_unit(unit),
        flag: flag.to_string(),
    }
}
