//! CSV files as append-only mapping tables.

use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use labhpo_core::{BatchSink, SinkError};
use labhpo_model::{DirectMapping, InferredMapping};
use serde::Serialize;
use tracing::debug;

/// A row type with a fixed CSV header.
pub trait TableRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl TableRow for DirectMapping {
    const HEADER: &'static [&'static str] = &["ROW_ID", "NEGATED", "MAP_TO"];
}

impl TableRow for InferredMapping {
    const HEADER: &'static [&'static str] = &["SOURCE_ROW_ID", "INFERRED_TO"];
}

/// Append-only CSV table.
///
/// `truncate` recreates the file with just the header. Each
/// `append_batch` writes every row and flushes before returning, so a
/// batch is either on disk or the call failed.
pub struct CsvTableSink<T> {
    path: PathBuf,
    writer: Option<Writer<File>>,
    _row: PhantomData<fn(&T)>,
}

pub type DirectMappingSink = CsvTableSink<DirectMapping>;
pub type InferredMappingSink = CsvTableSink<InferredMapping>;

impl<T: TableRow> CsvTableSink<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: &csv::Error) -> SinkError {
        SinkError::Csv {
            path: self.path.clone(),
            message: source.to_string(),
        }
    }

    /// Writer positioned at the end of the table, writing the header first
    /// if the file is new or empty.
    fn writer(&mut self) -> Result<&mut Writer<File>, SinkError> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|err| self.io_error(err))?;
            let empty = file
                .metadata()
                .map_err(|err| self.io_error(err))?
                .len()
                == 0;
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
            if empty {
                writer
                    .write_record(T::HEADER)
                    .map_err(|err| self.csv_error(&err))?;
            }
            self.writer = Some(writer);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| SinkError::Message("table writer unavailable".to_string()))
    }
}

impl<T: TableRow> BatchSink<T> for CsvTableSink<T> {
    fn truncate(&mut self) -> Result<(), SinkError> {
        self.writer = None;
        let file = File::create(&self.path).map_err(|err| self.io_error(err))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(T::HEADER)
            .map_err(|err| self.csv_error(&err))?;
        writer.flush().map_err(|err| self.io_error(err))?;
        self.writer = Some(writer);
        debug!(path = %self.path.display(), "Truncated table");
        Ok(())
    }

    fn append_batch(&mut self, batch: &[T]) -> Result<(), SinkError> {
        let path = self.path.clone();
        let writer = self.writer()?;
        for row in batch {
            writer.serialize(row).map_err(|err| SinkError::Csv {
                path: path.clone(),
                message: err.to_string(),
            })?;
        }
        writer.flush().map_err(|source| SinkError::Io { path, source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labhpo_model::NegationFlag;

    #[test]
    fn append_without_truncate_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab_hpo.csv");
        let row = DirectMapping {
            row_id: 1,
            negated: NegationFlag::Present,
            map_to: "HP:0001234".to_string(),
        };

        let mut sink = DirectMappingSink::new(&path);
        sink.append_batch(std::slice::from_ref(&row)).unwrap();
        drop(sink);
        let mut sink = DirectMappingSink::new(&path);
        sink.append_batch(std::slice::from_ref(&row)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "ROW_ID,NEGATED,MAP_TO\n1,F,HP:0001234\n1,F,HP:0001234\n");
    }
}
