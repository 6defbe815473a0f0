//! Lab event ingestion and summary persistence.

pub mod error;
pub mod lab_events;
pub mod summary_io;

pub use error::IngestError;
pub use lab_events::{CHARTTIME_FORMAT, LabEventReader, ReadStats, read_lab_events};
pub use summary_io::{
    SUMMARY_HEADER, load_summaries, read_summaries, save_summaries, write_summaries,
};
