//! Streaming reader for raw lab-event CSV files.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use labhpo_model::{RawLabResult, normalize_unit};
use tracing::warn;

use crate::error::IngestError;

/// Timestamp layout of the `CHARTTIME` column.
pub const CHARTTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COLUMNS: [&str; 9] = [
    "ROW_ID",
    "SUBJECT_ID",
    "HADM_ID",
    "ITEMID",
    "CHARTTIME",
    "VALUE",
    "VALUENUM",
    "VALUEUOM",
    "FLAG",
];

/// Counters for one pass over a lab-event file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub read: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    row_id: usize,
    subject_id: usize,
    admission_id: usize,
    test_id: usize,
    charted_at: usize,
    value: usize,
    value_num: usize,
    unit: usize,
    flag: usize,
    width: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self, IngestError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().trim_matches('\u{feff}').to_uppercase())
            .collect();
        let mut idx = [0usize; COLUMNS.len()];
        for (slot, column) in idx.iter_mut().zip(COLUMNS) {
            *slot = names.iter().position(|name| name == column).ok_or_else(|| {
                IngestError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                }
            })?;
        }
        let [row_id, subject_id, admission_id, test_id, charted_at, value, value_num, unit, flag] =
            idx;
        Ok(Self {
            row_id,
            subject_id,
            admission_id,
            test_id,
            charted_at,
            value,
            value_num,
            unit,
            flag,
            width: names.len(),
        })
    }
}

/// Iterator over the well-formed records of a lab-event file.
///
/// Records with the wrong field count or non-numeric identifiers are
/// skipped with a warning and counted in [`ReadStats::skipped`]. Only I/O
/// failures end the iteration with an error.
pub struct LabEventReader<R: Read> {
    path: PathBuf,
    records: StringRecordsIntoIter<R>,
    columns: ColumnIndex,
    stats: ReadStats,
}

impl LabEventReader<File> {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path)
    }
}

impl<R: Read> LabEventReader<R> {
    /// Wrap any reader. `path` only labels errors and log lines.
    pub fn from_reader(reader: R, path: &Path) -> Result<Self, IngestError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|err| IngestError::csv(path, err))?
            .clone();
        let columns = ColumnIndex::resolve(&headers, path)?;
        Ok(Self {
            path: path.to_path_buf(),
            records: reader.into_records(),
            columns,
            stats: ReadStats::default(),
        })
    }

    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    fn skip(&mut self, line: u64, reason: &str) {
        self.stats.skipped += 1;
        warn!(path = %self.path.display(), line, reason, "Skipping malformed lab event");
    }
}

impl<R: Read> Iterator for LabEventReader<R> {
    type Item = Result<RawLabResult, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) if err.is_io_error() => {
                    return Some(Err(IngestError::csv(&self.path, err)));
                }
                Err(err) => {
                    let line = err.position().map(|pos| pos.line()).unwrap_or_default();
                    self.skip(line, "unreadable record");
                    continue;
                }
            };
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            match parse_record(&record, &self.columns) {
                Ok(result) => {
                    self.stats.read += 1;
                    return Some(Ok(result));
                }
                Err(reason) => self.skip(line, reason),
            }
        }
    }
}

fn parse_record(record: &StringRecord, columns: &ColumnIndex) -> Result<RawLabResult, &'static str> {
    if record.len() != columns.width {
        return Err("wrong field count");
    }
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let row_id = field(columns.row_id)
        .parse::<u64>()
        .map_err(|_| "non-numeric ROW_ID")?;
    let subject_id = field(columns.subject_id)
        .parse::<u64>()
        .map_err(|_| "non-numeric SUBJECT_ID")?;
    let admission_id = match field(columns.admission_id) {
        "" => None,
        raw => Some(raw.parse::<u64>().map_err(|_| "non-numeric HADM_ID")?),
    };
    let test_id = field(columns.test_id)
        .parse::<u32>()
        .map_err(|_| "non-numeric ITEMID")?;
    let charted_at = NaiveDateTime::parse_from_str(field(columns.charted_at), CHARTTIME_FORMAT).ok();
    let value_num = field(columns.value_num)
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite());

    Ok(RawLabResult {
        row_id,
        subject_id,
        admission_id,
        test_id,
        charted_at,
        value: field(columns.value).to_string(),
        value_num,
        unit: normalize_unit(field(columns.unit)),
        flag: field(columns.flag).to_string(),
    })
}

/// Read every well-formed record of a lab-event file into memory.
pub fn read_lab_events(path: &Path) -> Result<(Vec<RawLabResult>, ReadStats), IngestError> {
    let mut reader = LabEventReader::open(path)?;
    let results = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok((results, reader.stats()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ROW_ID,SUBJECT_ID,HADM_ID,ITEMID,CHARTTIME,VALUE,VALUENUM,VALUEUOM,FLAG\n";

    fn read(body: &str) -> (Vec<RawLabResult>, ReadStats) {
        let text = format!("{HEADER}{body}");
        let mut reader = LabEventReader::from_reader(text.as_bytes(), Path::new("labevents.csv"))
            .expect("reader");
        let results = reader.by_ref().collect::<Result<Vec<_>, _>>().expect("records");
        (results, reader.stats())
    }

    #[test]
    fn parses_complete_record() {
        let (results, stats) = read("281,3,,50820,2101-10-12 16:07:00,7.39,7.39,\"units\",\n");
        assert_eq!(stats, ReadStats { read: 1, skipped: 0 });
        let result = &results[0];
        assert_eq!(result.row_id, 281);
        assert_eq!(result.admission_id, None);
        assert_eq!(result.test_id, 50820);
        assert_eq!(result.value_num, Some(7.39));
        assert_eq!(result.unit, "units");
        assert!(result.charted_at.is_some());
    }

    #[test]
    fn blank_numeric_value_and_unit() {
        let (results, _) = read("1,2,100,51266,2101-10-12 16:07:00,RARE,,,abnormal\n");
        let result = &results[0];
        assert_eq!(result.admission_id, Some(100));
        assert_eq!(result.value, "RARE");
        assert_eq!(result.value_num, None);
        assert_eq!(result.unit, "?");
        assert!(result.is_flagged_abnormal());
    }

    #[test]
    fn unparsable_timestamp_keeps_record() {
        let (results, stats) = read("1,2,,50878,yesterday,31,31,IU/L,\n");
        assert_eq!(stats.skipped, 0);
        assert_eq!(results[0].charted_at, None);
        assert_eq!(results[0].unit, "iu/l");
    }

    #[test]
    fn malformed_records_are_skipped() {
        let (results, stats) = read(
            "x,2,,50878,2101-10-12 16:07:00,31,31,IU/L,\n\
             2,2,,50878,2101-10-12 16:07:00,31\n\
             3,2,,50878,2101-10-12 16:07:00,31,31,IU/L,\n",
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].row_id, 3);
        assert_eq!(stats, ReadStats { read: 1, skipped: 2 });
    }

    #[test]
    fn missing_column_is_fatal() {
        let text = "ROW_ID,ITEMID\n1,2\n";
        let err = LabEventReader::from_reader(text.as_bytes(), Path::new("bad.csv"))
            .err()
            .expect("missing columns");
        assert!(matches!(err, IngestError::MissingColumn { column, .. } if column == "SUBJECT_ID"));
    }
}
