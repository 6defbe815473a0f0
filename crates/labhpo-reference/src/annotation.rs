//! Standardized code + interpretation code to phenotype term annotations.

use std::path::Path;

use labhpo_model::{InterpretationCode, LoincCode, TermId};
use tracing::{debug, info};

use crate::csv_utils::{Row, read_rows, require_columns};
use crate::error::ReferenceError;

const CODE: &str = "loincId";
const SYSTEM: &str = "system";
const INTERPRETATION: &str = "code";
const TERM: &str = "hpoTermId";
const NEGATED: &str = "isNegated";

/// Only annotations in this coding system carry L/H/N/NEG/POS interpretations.
pub const INTERPRETATION_SYSTEM: &str = "FHIR";

/// One annotation row: a candidate term for a (code, interpretation) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub code: LoincCode,
    pub interpretation: InterpretationCode,
    pub term: TermId,
    pub negated: bool,
}

/// Load the tab-separated annotation table.
///
/// Any malformed row is fatal: the reference dataset is treated as corrupt.
pub fn load_annotations(path: &Path) -> Result<Vec<AnnotationRecord>, ReferenceError> {
    let rows = read_rows(path, b'\t')?;
    let records = build_annotations(&rows, path)?;
    info!(path = %path.display(), annotations = records.len(), "Loaded annotations");
    Ok(records)
}

pub(crate) fn build_annotations(
    rows: &[Row],
    path: &Path,
) -> Result<Vec<AnnotationRecord>, ReferenceError> {
    require_columns(rows, &[CODE, INTERPRETATION, TERM, NEGATED], path)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let system = row.get(SYSTEM);
        if !system.is_empty() && !system.eq_ignore_ascii_case(INTERPRETATION_SYSTEM) {
            debug!(line = row.line, system, "Skipping annotation from other coding system");
            continue;
        }
        records.push(parse_record(row, path)?);
    }
    Ok(records)
}

fn parse_record(row: &Row, path: &Path) -> Result<AnnotationRecord, ReferenceError> {
    let invalid = |message: String| ReferenceError::InvalidValue {
        path: path.to_path_buf(),
        line: row.line,
        message,
    };
    let code = LoincCode::parse(row.get(CODE)).map_err(|err| invalid(err.to_string()))?;
    let interpretation = row
        .get(INTERPRETATION)
        .parse::<InterpretationCode>()
        .map_err(|err| invalid(err.to_string()))?;
    let term = TermId::parse(row.get(TERM)).map_err(|err| invalid(err.to_string()))?;
    let negated = match row.get(NEGATED).to_ascii_lowercase().as_str() {
        "true" => true,
        "false" | "" => false,
        other => return Err(invalid(format!("isNegated must be true or false, got `{other}`"))),
    };
    Ok(AnnotationRecord {
        code,
        interpretation,
        term,
        negated,
    })
}
