//! Stream a direct-mapping CSV back as a [`MappingSource`].
//!
//! Opening the table scans it once for its row-id range. Each
//! `load_range` call then reads only as far as the requested range, so a
//! closure run holds one batch of rows at a time.

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use labhpo_core::{MappingSource, SinkError};
use labhpo_model::DirectMapping;
use tracing::{debug, info};

type Records = DeserializeRecordsIntoIter<File, DirectMapping>;

/// A `ROW_ID,NEGATED,MAP_TO` table on disk.
///
/// Works for any direct-mapping table of that shape, whether the rows came
/// from lab results or from terms mined out of clinical notes.
pub struct CsvMappingSource {
    path: PathBuf,
    rows: u64,
    range: Option<(u64, u64)>,
    ordered: bool,
    cursor: RefCell<Option<Cursor>>,
}

/// Forward reader over an ordered table. Every row below `next_lo` has
/// been consumed; `pending` holds the first row past the last range.
struct Cursor {
    records: Records,
    pending: Option<DirectMapping>,
    next_lo: Option<u64>,
}

impl CsvMappingSource {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let mut rows = 0u64;
        let mut range: Option<(u64, u64)> = None;
        let mut ordered = true;
        let mut previous = None;
        for record in open_records(path)? {
            let row = record.map_err(|err| csv_error(path, &err))?;
            rows += 1;
            if previous.is_some_and(|id| row.row_id < id) {
                ordered = false;
            }
            previous = Some(row.row_id);
            range = Some(match range {
                Some((min, max)) => (min.min(row.row_id), max.max(row.row_id)),
                None => (row.row_id, row.row_id),
            });
        }
        info!(path = %path.display(), rows, ordered, "Opened direct mappings");
        Ok(Self {
            path: path.to_path_buf(),
            rows,
            range,
            ordered,
            cursor: RefCell::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Whether row ids never decrease down the file.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    fn scan_range(&self, lo: u64, hi: u64) -> Result<Vec<DirectMapping>, SinkError> {
        let mut rows = Vec::new();
        for record in open_records(&self.path)? {
            let row = record.map_err(|err| csv_error(&self.path, &err))?;
            if (lo..=hi).contains(&row.row_id) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn advance(&self, lo: u64, hi: u64) -> Result<Vec<DirectMapping>, SinkError> {
        let mut slot = self.cursor.borrow_mut();
        let mut cursor = match slot.take() {
            Some(cursor) if cursor.next_lo.is_some_and(|next| next <= lo) => cursor,
            _ => {
                debug!(path = %self.path.display(), lo, "Rewinding direct mappings");
                Cursor {
                    records: open_records(&self.path)?,
                    pending: None,
                    next_lo: Some(0),
                }
            }
        };

        let mut rows = Vec::new();
        let mut next = cursor.pending.take();
        loop {
            let row = match next.take() {
                Some(row) => row,
                None => match cursor.records.next() {
                    Some(record) => record.map_err(|err| csv_error(&self.path, &err))?,
                    None => break,
                },
            };
            if row.row_id < lo {
                continue;
            }
            if row.row_id > hi {
                cursor.pending = Some(row);
                break;
            }
            rows.push(row);
        }
        cursor.next_lo = hi.checked_add(1);
        *slot = Some(cursor);
        Ok(rows)
    }
}

impl MappingSource for CsvMappingSource {
    fn row_id_range(&self) -> Result<Option<(u64, u64)>, SinkError> {
        Ok(self.range)
    }

    fn load_range(&self, lo: u64, hi: u64) -> Result<Vec<DirectMapping>, SinkError> {
        if lo > hi {
            return Ok(Vec::new());
        }
        if self.ordered {
            self.advance(lo, hi)
        } else {
            self.scan_range(lo, hi)
        }
    }
}

fn open_records(path: &Path) -> Result<Records, SinkError> {
    let file = File::open(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file)
        .into_deserialize())
}

fn csv_error(path: &Path, err: &csv::Error) -> SinkError {
    SinkError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
