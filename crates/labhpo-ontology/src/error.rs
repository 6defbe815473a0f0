use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntologyError {
    #[error("failed to read ontology {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ontology at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("is_a cycle detected through {term}")]
    Cycle { term: String },
}
