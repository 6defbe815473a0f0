//! Standardized code to measurement scale lookup.

use std::collections::HashMap;
use std::path::Path;

use labhpo_model::{LoincCode, Scale};
use tracing::{debug, info};

use crate::csv_utils::{Row, read_rows, require_columns};
use crate::error::ReferenceError;

const CODE: &str = "LOINC_NUM";
const SCALE: &str = "SCALE_TYP";

#[derive(Debug, Clone, Default)]
pub struct ScaleTable {
    scales: HashMap<LoincCode, Scale>,
}

impl ScaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: LoincCode, scale: Scale) {
        self.scales.insert(code, scale);
    }

    pub fn scale_of(&self, code: &LoincCode) -> Option<Scale> {
        self.scales.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

impl FromIterator<(LoincCode, Scale)> for ScaleTable {
    fn from_iter<T: IntoIterator<Item = (LoincCode, Scale)>>(iter: T) -> Self {
        Self {
            scales: iter.into_iter().collect(),
        }
    }
}

/// Load `LOINC_NUM,SCALE_TYP` (other columns ignored).
pub fn load_scale_table(path: &Path) -> Result<ScaleTable, ReferenceError> {
    let rows = read_rows(path, b',')?;
    let table = build_scale_table(&rows, path)?;
    info!(path = %path.display(), codes = table.len(), "Loaded scale table");
    Ok(table)
}

pub(crate) fn build_scale_table(rows: &[Row], path: &Path) -> Result<ScaleTable, ReferenceError> {
    require_columns(rows, &[CODE, SCALE], path)?;
    let mut table = ScaleTable::new();
    for row in rows {
        match LoincCode::parse(row.get(CODE)) {
            Ok(code) => table.insert(code, Scale::parse(row.get(SCALE))),
            Err(err) => debug!(line = row.line, %err, "Skipping scale row"),
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_utils::read_rows_from;

    #[test]
    fn scales_are_parsed_by_abbreviation() {
        let text = "LOINC_NUM,COMPONENT,SCALE_TYP\n1920-8,AST,Qn\n5778-6,Color,Nom\n778-1,Platelets,Ord\n100-8,X,Doc\nbad,Y,Qn\n";
        let path = Path::new("scale.csv");
        let rows = read_rows_from(text.as_bytes(), b',', path).unwrap();
        let table = build_scale_table(&rows, path).unwrap();
        assert_eq!(table.len(), 4);
        let code = |raw: &str| LoincCode::parse(raw).unwrap();
        assert_eq!(table.scale_of(&code("1920-8")), Some(Scale::Quantitative));
        assert_eq!(table.scale_of(&code("5778-6")), Some(Scale::Nominal));
        assert_eq!(table.scale_of(&code("778-1")), Some(Scale::Ordinal));
        assert_eq!(table.scale_of(&code("100-8")), Some(Scale::Other));
        assert_eq!(table.scale_of(&code("2345-7")), None);
    }
}
