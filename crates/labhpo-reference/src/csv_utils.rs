//! Shared delimited-file utilities for loading reference tables.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::error::ReferenceError;

/// Environment variable for overriding the reference data directory.
pub const REFERENCE_ENV_VAR: &str = "LABHPO_REFERENCE_DIR";

pub const LAB_DICTIONARY_FILE: &str = "lab_dictionary.csv";
pub const SCALE_TABLE_FILE: &str = "scale_table.csv";
pub const ANNOTATIONS_FILE: &str = "annotations.tsv";
pub const ONTOLOGY_FILE: &str = "hp.obo";

/// Get the default reference data directory.
///
/// Checks the `LABHPO_REFERENCE_DIR` environment variable first,
/// then falls back to the `reference/` directory relative to the crate.
pub fn default_reference_root() -> PathBuf {
    if let Ok(root) = std::env::var(REFERENCE_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../reference")
}

/// One data row keyed by header, with the 1-based line it came from.
#[derive(Debug, Clone)]
pub struct Row {
    pub line: u64,
    pub fields: BTreeMap<String, String>,
}

impl Row {
    /// Trimmed field value, empty string if the column is absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Field value, `None` if empty or missing.
    pub fn optional(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Read a delimited file into rows keyed by header.
pub fn read_rows(path: &Path, delimiter: u8) -> Result<Vec<Row>, ReferenceError> {
    let file = File::open(path).map_err(|source| ReferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows_from(file, delimiter, path)
}

/// Read delimited text from any reader. `path` only labels errors.
///
/// Header BOMs are stripped and values trimmed. Rows may be shorter or
/// longer than the header; missing cells read as empty.
pub fn read_rows_from<R: Read>(
    reader: R,
    delimiter: u8,
    path: &Path,
) -> Result<Vec<Row>, ReferenceError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| ReferenceError::csv(path, &err))?
        .iter()
        .map(|h| h.trim().trim_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ReferenceError::csv(path, &err))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, key)| {
                let value = record.get(idx).unwrap_or("").trim().to_string();
                (key.clone(), value)
            })
            .collect();
        rows.push(Row { line, fields });
    }
    Ok(rows)
}

/// Fail with `MissingColumn` unless every column appears in the first row.
pub fn require_columns(
    rows: &[Row],
    columns: &[&str],
    path: &Path,
) -> Result<(), ReferenceError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for column in columns {
        if !first.fields.contains_key(*column) {
            return Err(ReferenceError::MissingColumn {
                path: path.to_path_buf(),
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_keyed_by_trimmed_header() {
        let text = "\u{feff}A, B\n 1 ,x\n2\n";
        let rows = read_rows_from(text.as_bytes(), b',', Path::new("inline.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("A"), "1");
        assert_eq!(rows[0].get("B"), "x");
        assert_eq!(rows[1].optional("B"), None);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn missing_column_is_reported() {
        let rows = read_rows_from("A\n1\n".as_bytes(), b',', Path::new("t.csv")).unwrap();
        let err = require_columns(&rows, &["A", "B"], Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, ReferenceError::MissingColumn { column, .. } if column == "B"));
    }
}
