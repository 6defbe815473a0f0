pub mod error;
pub mod ids;
pub mod interpretation;
pub mod lab;
pub mod outcome;
pub mod summary;

pub use error::{ModelError, Result};
pub use ids::{LoincCode, TermId};
pub use interpretation::{InterpretationCode, Scale};
pub use lab::{ABNORMAL_FLAG, RawLabResult, UNKNOWN_UNIT, is_abnormal_flag, normalize_unit};
pub use outcome::{
    CandidateTerm, ClassificationOutcome, DirectMapping, ErrorKind, InferredMapping, NegationFlag,
};
pub use summary::{LabSummary, NormalRange, UnitSummary};
