//! Lab result interpretation and ontology closure.
//!
//! Data flows through the crate in two passes:
//!
//! 1. [`StatisticsAggregator`] folds every raw result into per-test
//!    summaries, then [`LabResultClassifier`] turns each result into a
//!    [`ClassificationOutcome`](labhpo_model::ClassificationOutcome) which is
//!    written through a [`MappingBatcher`].
//! 2. [`OntologyClosureEngine`] reads the direct mappings back from a
//!    [`MappingSource`] and writes one inferred row per strict ancestor.

pub mod annotation;
pub mod batcher;
pub mod classifier;
pub mod closure;
pub mod diagnostics;
pub mod error;
pub mod fallback;
pub mod sink;
pub mod statistics;

pub use annotation::AnnotationIndex;
pub use batcher::{BatchStats, MappingBatcher};
pub use classifier::{
    InterpretationRule, LabResultClassifier, LocalCodeLookup, QuantitativeReading, read_ordinal,
    read_quantitative,
};
pub use closure::{
    ClosureConfig, ClosureReport, ClosureState, DEFAULT_BATCH_SIZE, OntologyClosureEngine,
};
pub use diagnostics::ClassificationDiagnostics;
pub use error::{CoreError, SinkError};
pub use fallback::{FallbackPattern, TextualFallbacks};
pub use sink::{BatchSink, MappingSource, MemoryMappingStore, MemorySink};
pub use statistics::{AggregationStats, StatisticsAggregator};
