//! Tab-separated report of quantitative tests whose textual fallback failed.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use labhpo_core::{ClassificationDiagnostics, SinkError};
use tracing::info;

const FALLBACK_HEADER: [&str; 2] = ["ITEMID", "LOINC"];

pub fn write_fallback_failures<W: Write>(
    writer: W,
    diagnostics: &ClassificationDiagnostics,
) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(FALLBACK_HEADER)?;
    for (test_id, code) in diagnostics.fallback_failures() {
        writer.write_record([test_id.to_string().as_str(), code.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_fallback_report(
    path: &Path,
    diagnostics: &ClassificationDiagnostics,
) -> Result<(), SinkError> {
    let file = File::create(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_fallback_failures(file, diagnostics).map_err(|err| SinkError::Csv {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    info!(
        path = %path.display(),
        tests = diagnostics.fallback_failures().len(),
        "Wrote fallback diagnostics"
    );
    Ok(())
}
