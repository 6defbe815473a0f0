use std::path::PathBuf;

use labhpo_model::LoincCode;

/// Failures of a batch sink or mapping source. Any of these aborts the
/// current run; a partially written batch is never skipped silently.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("{0}")]
    Message(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("annotated code {code} has no scale entry")]
    MissingScale { code: LoincCode },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error(transparent)]
    Sink(#[from] SinkError),
}
