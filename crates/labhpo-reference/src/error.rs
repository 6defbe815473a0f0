use std::path::PathBuf;

/// Fatal problems with reference data. Any of these aborts a run before a
/// single lab result is classified.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("missing column {column} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("invalid value in {path} at line {line}: {message}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl ReferenceError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: &csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            message: source.to_string(),
        }
    }
}
