//! File-backed mapping tables and reports.

pub mod csv_sink;
pub mod diagnostics_report;
pub mod mapping_source;

pub use csv_sink::{CsvTableSink, DirectMappingSink, InferredMappingSink, TableRow};
pub use diagnostics_report::{save_fallback_report, write_fallback_failures};
pub use mapping_source::CsvMappingSource;
