use std::path::PathBuf;

use labhpo_cli::pipeline::ClassifyReport;
use labhpo_core::{AggregationStats, ClosureReport};
use labhpo_ingest::ReadStats;

/// What a subcommand produced, for the end-of-run summary.
#[derive(Debug, Default)]
pub struct CommandResult {
    pub outputs: Vec<(&'static str, PathBuf)>,
    pub read: Option<ReadStats>,
    pub aggregation: Option<AggregationStats>,
    pub classification: Option<ClassifyReport>,
    pub closure: Option<ClosureReport>,
}
