//! Local lab test dictionary: local test id to standardized code.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::csv_utils::{Row, read_rows, require_columns};
use crate::error::ReferenceError;

const ITEM_ID: &str = "ITEMID";
const CODE: &str = "LOINC_CODE";

/// Descriptive metadata for one local test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub test_id: u32,
    pub label: String,
    pub fluid: String,
    pub category: String,
    /// Raw standardized code text. Validated at classification time so that
    /// a bad code becomes a per-record rejection rather than a load failure.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LabDictionary {
    entries: BTreeMap<u32, DictionaryEntry>,
}

impl LabDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless the test id is already present.
    pub fn insert(&mut self, entry: DictionaryEntry) -> bool {
        if self.entries.contains_key(&entry.test_id) {
            return false;
        }
        self.entries.insert(entry.test_id, entry);
        true
    }

    /// Build a dictionary from `(test id, code)` pairs.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut dictionary = Self::new();
        for (test_id, code) in codes {
            let code = code.into();
            dictionary.insert(DictionaryEntry {
                test_id,
                label: String::new(),
                fluid: String::new(),
                category: String::new(),
                code: (!code.trim().is_empty()).then(|| code.trim().to_string()),
            });
        }
        dictionary
    }

    /// Standardized code for a local test, `None` when unmapped.
    pub fn code_for(&self, test_id: u32) -> Option<&str> {
        self.entries.get(&test_id).and_then(|e| e.code.as_deref())
    }

    pub fn entry(&self, test_id: u32) -> Option<&DictionaryEntry> {
        self.entries.get(&test_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.values().filter(|e| e.code.is_some()).count()
    }
}

/// Load `ROW_ID,ITEMID,LABEL,FLUID,CATEGORY,LOINC_CODE`.
///
/// Rows with a non-numeric item id are skipped with a warning. The first
/// row for a given item id wins.
pub fn load_lab_dictionary(path: &Path) -> Result<LabDictionary, ReferenceError> {
    let rows = read_rows(path, b',')?;
    let dictionary = build_dictionary(&rows, path)?;
    info!(
        path = %path.display(),
        tests = dictionary.len(),
        mapped = dictionary.mapped_count(),
        "Loaded lab dictionary"
    );
    Ok(dictionary)
}

pub(crate) fn build_dictionary(rows: &[Row], path: &Path) -> Result<LabDictionary, ReferenceError> {
    require_columns(rows, &[ITEM_ID, CODE], path)?;
    let mut dictionary = LabDictionary::new();
    for row in rows {
        let Ok(test_id) = row.get(ITEM_ID).parse::<u32>() else {
            warn!(line = row.line, item_id = row.get(ITEM_ID), "Skipping dictionary row with invalid ITEMID");
            continue;
        };
        let entry = DictionaryEntry {
            test_id,
            label: clean(row.get("LABEL")),
            fluid: clean(row.get("FLUID")),
            category: clean(row.get("CATEGORY")),
            code: row.optional(CODE).map(clean).filter(|c| !c.is_empty()),
        };
        if !dictionary.insert(entry) {
            warn!(line = row.line, test_id, "Duplicate dictionary entry ignored");
        }
    }
    Ok(dictionary)
}

fn clean(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}
