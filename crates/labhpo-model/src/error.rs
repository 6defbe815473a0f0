use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid term id: {0:?}")]
    InvalidTermId(String),
    #[error("malformed standardized code: {0:?}")]
    MalformedCode(String),
    #[error("unknown interpretation code: {0:?}")]
    UnknownInterpretation(String),
    #[error("unknown negation flag: {0:?}")]
    UnknownNegation(String),
    #[error("unknown error kind: {0:?}")]
    UnknownErrorKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
