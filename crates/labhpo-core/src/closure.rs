//! Ontology closure: expand direct mappings to every strict ancestor term.
//!
//! The engine walks the source in row-id-range batches. Each batch is loaded,
//! expanded in memory, flushed to the sink as a single append, and dropped,
//! so peak memory depends on the batch size rather than the table size.
//!
//! ```text
//! Idle -> TableTruncated -> (BatchLoaded -> BatchExpanded -> BatchFlushed)* -> Done
//! ```

use labhpo_model::{DirectMapping, InferredMapping, NegationFlag, TermId};
use labhpo_ontology::AncestorQuery;
use tracing::{debug, info, info_span, warn};

use crate::error::CoreError;
use crate::sink::{BatchSink, MappingSource};

pub const DEFAULT_BATCH_SIZE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureConfig {
    batch_size: u64,
}

impl ClosureConfig {
    pub fn new(batch_size: u64) -> Result<Self, CoreError> {
        if batch_size == 0 {
            return Err(CoreError::InvalidBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Position of the engine within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureState {
    Idle,
    TableTruncated,
    BatchLoaded { lo: u64, hi: u64 },
    BatchExpanded { lo: u64, hi: u64 },
    BatchFlushed { lo: u64, hi: u64 },
    Done,
}

/// Totals for one closure run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureReport {
    pub batches: u64,
    /// Direct-mapping rows loaded from the source.
    pub rows_read: u64,
    /// Present-finding rows whose term was expanded.
    pub rows_expanded: u64,
    /// Present-finding rows dropped for a malformed or unknown term.
    pub rows_skipped: u64,
    /// Inferred rows appended to the sink.
    pub rows_written: u64,
}

pub struct OntologyClosureEngine<'a, O: ?Sized> {
    ontology: &'a O,
    config: ClosureConfig,
    state: ClosureState,
}

impl<'a, O: AncestorQuery + ?Sized> OntologyClosureEngine<'a, O> {
    pub fn new(ontology: &'a O, config: ClosureConfig) -> Self {
        Self {
            ontology,
            config,
            state: ClosureState::Idle,
        }
    }

    pub fn state(&self) -> ClosureState {
        self.state
    }

    /// Rebuild the closure table from `source` into `sink`.
    ///
    /// The sink is truncated first, so repeated runs over the same source
    /// leave the same table behind. Any source or sink failure aborts the run.
    pub fn run<S, K>(&mut self, source: &S, sink: &mut K) -> Result<ClosureReport, CoreError>
    where
        S: MappingSource + ?Sized,
        K: BatchSink<InferredMapping> + ?Sized,
    {
        let _span = info_span!("infer", batch_size = self.config.batch_size).entered();
        self.state = ClosureState::Idle;
        let mut report = ClosureReport::default();

        sink.truncate()?;
        self.state = ClosureState::TableTruncated;

        let Some((min, max)) = source.row_id_range()? else {
            self.state = ClosureState::Done;
            info!("No direct mappings to expand");
            return Ok(report);
        };

        let mut lo = min;
        while lo <= max {
            let hi = lo.saturating_add(self.config.batch_size - 1).min(max);

            let rows = source.load_range(lo, hi)?;
            self.state = ClosureState::BatchLoaded { lo, hi };

            let inferred = self.expand_batch(&rows, &mut report);
            self.state = ClosureState::BatchExpanded { lo, hi };

            if !inferred.is_empty() {
                sink.append_batch(&inferred)?;
            }
            report.batches += 1;
            report.rows_written += inferred.len() as u64;
            self.state = ClosureState::BatchFlushed { lo, hi };
            debug!(lo, hi, rows = rows.len(), inferred = inferred.len(), "Flushed closure batch");

            match hi.checked_add(1) {
                Some(next) => lo = next,
                None => break,
            }
        }

        self.state = ClosureState::Done;
        info!(
            batches = report.batches,
            rows_read = report.rows_read,
            rows_expanded = report.rows_expanded,
            rows_skipped = report.rows_skipped,
            rows_written = report.rows_written,
            "Closure complete"
        );
        Ok(report)
    }

    /// Expand one batch of direct mappings. Negated and rejected rows emit
    /// nothing; present findings emit one row per strict ancestor.
    ///
    /// Mappings that share a row id are expanded independently, so an
    /// ancestor common to both appears once for each of them.
    pub fn expand_batch(
        &self,
        rows: &[DirectMapping],
        report: &mut ClosureReport,
    ) -> Vec<InferredMapping> {
        let mut inferred = Vec::new();
        for row in rows {
            report.rows_read += 1;
            if row.negated != NegationFlag::Present {
                continue;
            }
            let term = match TermId::parse(&row.map_to) {
                Ok(term) => term,
                Err(err) => {
                    warn!(row_id = row.row_id, %err, "Skipping mapping with malformed term id");
                    report.rows_skipped += 1;
                    continue;
                }
            };
            let Some(ancestors) = self.ontology.ancestors(&term, false) else {
                warn!(row_id = row.row_id, term = %term, "Skipping mapping to term outside the ontology");
                report.rows_skipped += 1;
                continue;
            };
            report.rows_expanded += 1;
            inferred.extend(ancestors.into_iter().map(|ancestor| InferredMapping {
                source_row_id: row.row_id,
                ancestor,
            }));
        }
        inferred.sort_by_key(|mapping: &InferredMapping| mapping.source_row_id);
        inferred
    }
}
