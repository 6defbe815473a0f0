//! Tab-separated persistence for per-test lab summaries.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use labhpo_model::{LabSummary, NormalRange, UnitSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::IngestError;

pub const SUMMARY_HEADER: [&str; 8] = [
    "ITEMID",
    "UNIT",
    "COUNT",
    "MEAN",
    "NORMAL_COUNT",
    "MIN_NORMAL",
    "MEAN_NORMAL",
    "MAX_NORMAL",
];

#[derive(Debug, Serialize, Deserialize)]
struct SummaryRow {
    #[serde(rename = "ITEMID")]
    test_id: u32,
    #[serde(rename = "UNIT")]
    unit: String,
    #[serde(rename = "COUNT")]
    count: u64,
    #[serde(rename = "MEAN")]
    mean: f64,
    #[serde(rename = "NORMAL_COUNT")]
    normal_count: Option<u64>,
    #[serde(rename = "MIN_NORMAL")]
    min_normal: Option<f64>,
    #[serde(rename = "MEAN_NORMAL")]
    mean_normal: Option<f64>,
    #[serde(rename = "MAX_NORMAL")]
    max_normal: Option<f64>,
}

impl SummaryRow {
    fn from_unit(test_id: u32, unit: &UnitSummary) -> Self {
        let range = unit.normal_range;
        Self {
            test_id,
            unit: unit.unit.clone(),
            count: unit.count,
            mean: unit.mean,
            normal_count: range.map(|r| r.count),
            min_normal: range.map(|r| r.min),
            mean_normal: range.map(|r| r.mean),
            max_normal: range.map(|r| r.max),
        }
    }

    fn into_unit(self) -> Result<(u32, UnitSummary), String> {
        let normal_range = match (self.min_normal, self.mean_normal, self.max_normal) {
            (Some(min), Some(mean), Some(max)) => Some(NormalRange {
                count: self.normal_count.unwrap_or_default(),
                min,
                mean,
                max,
            }),
            (None, None, None) => None,
            _ => return Err("normal range columns must be all present or all blank".to_string()),
        };
        Ok((
            self.test_id,
            UnitSummary {
                unit: self.unit,
                count: self.count,
                mean: self.mean,
                normal_range,
            },
        ))
    }
}

/// Write summaries ordered by test id, units in registration order.
pub fn write_summaries<'a, W, I>(writer: W, summaries: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a LabSummary>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(SUMMARY_HEADER)?;
    for summary in summaries {
        for unit in summary.units() {
            writer.serialize(SummaryRow::from_unit(summary.test_id, unit))?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn save_summaries(path: &Path, summaries: &BTreeMap<u32, LabSummary>) -> Result<(), IngestError> {
    let file = File::create(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_summaries(file, summaries.values()).map_err(|err| IngestError::csv(path, err))?;
    info!(path = %path.display(), tests = summaries.len(), "Saved lab summaries");
    Ok(())
}

/// Read summaries back. Any malformed line is an error.
pub fn read_summaries<R: Read>(
    reader: R,
    path: &Path,
) -> Result<BTreeMap<u32, LabSummary>, IngestError> {
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| IngestError::csv(path, err))?
        .clone();
    let mut summaries: BTreeMap<u32, LabSummary> = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::csv(path, err))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let row: SummaryRow = record
            .deserialize(Some(&headers))
            .map_err(|err| IngestError::csv(path, err))?;
        let (test_id, unit) = row.into_unit().map_err(|message| IngestError::InvalidSummary {
            path: path.to_path_buf(),
            line,
            message,
        })?;
        summaries
            .entry(test_id)
            .or_insert_with(|| LabSummary::new(test_id))
            .put(unit);
    }
    Ok(summaries)
}

pub fn load_summaries(path: &Path) -> Result<BTreeMap<u32, LabSummary>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let summaries = read_summaries(file, path)?;
    info!(path = %path.display(), tests = summaries.len(), "Loaded lab summaries");
    Ok(summaries)
}
