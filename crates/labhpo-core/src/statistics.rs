//! Aggregation pass: per-test unit counts, running means, and normal ranges.

use std::collections::BTreeMap;

use labhpo_model::{LabSummary, RawLabResult};
use tracing::trace;

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    /// Results folded into a running mean.
    pub observed: u64,
    /// Results whose value could not be read as a number.
    pub non_numeric: u64,
    /// Observed results that also contributed to a normal range.
    pub normal: u64,
}

/// Builds [`LabSummary`] values from a stream of raw results.
///
/// A single pass feeds both accumulators: every numeric value goes into the
/// unit's running mean, and values not flagged abnormal also go into the
/// unit's normal range.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator {
    summaries: BTreeMap<u32, LabSummary>,
    stats: AggregationStats,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw result. Non-numeric values are counted and otherwise ignored.
    pub fn observe(&mut self, result: &RawLabResult) {
        let Some(value) = result.numeric_value() else {
            self.stats.non_numeric += 1;
            trace!(row_id = result.row_id, test_id = result.test_id, "Non-numeric value");
            return;
        };
        self.add(result.test_id, &result.unit, value);
        if !result.is_flagged_abnormal() {
            self.add_normal(result.test_id, &result.unit, value);
        }
    }

    /// Fold one quantitative observation into the running mean for `(test_id, unit)`.
    pub fn add(&mut self, test_id: u32, unit: &str, value: f64) {
        self.entry(test_id).add(unit, value);
        self.stats.observed += 1;
    }

    /// Fold one non-abnormal observation into the normal range for `(test_id, unit)`.
    pub fn add_normal(&mut self, test_id: u32, unit: &str, value: f64) {
        self.entry(test_id).add_normal(unit, value);
        self.stats.normal += 1;
    }

    pub fn summary(&self, test_id: u32) -> Option<&LabSummary> {
        self.summaries.get(&test_id)
    }

    pub fn primary_unit(&self, test_id: u32) -> Option<&str> {
        self.summary(test_id)
            .and_then(LabSummary::primary_unit)
            .map(|unit| unit.unit.as_str())
    }

    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Hand over the finished, read-only summaries.
    pub fn finish(self) -> BTreeMap<u32, LabSummary> {
        self.summaries
    }

    fn entry(&mut self, test_id: u32) -> &mut LabSummary {
        self.summaries
            .entry(test_id)
            .or_insert_with(|| LabSummary::new(test_id))
    }
}

impl<'a> Extend<&'a RawLabResult> for StatisticsAggregator {
    fn extend<T: IntoIterator<Item = &'a RawLabResult>>(&mut self, iter: T) {
        for result in iter {
            self.observe(result);
        }
    }
}
