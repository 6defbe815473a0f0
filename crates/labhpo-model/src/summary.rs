//! Per-test summaries of observed units.

use serde::{Deserialize, Serialize};

/// Min/mean/max of the values that were not flagged abnormal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub count: u64,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl NormalRange {
    pub fn from_value(value: f64) -> Self {
        Self {
            count: 1,
            min: value,
            mean: value,
            max: value,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.mean = running_mean(self.mean, self.count, value);
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Statistics for one (test, unit) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit: String,
    pub count: u64,
    /// Running mean over every numeric value observed in this unit.
    pub mean: f64,
    /// Absent when no value in this unit was ever flagged normal.
    pub normal_range: Option<NormalRange>,
}

impl UnitSummary {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            count: 0,
            mean: 0.0,
            normal_range: None,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.mean = running_mean(self.mean, self.count, value);
        self.count += 1;
    }

    pub fn add_normal(&mut self, value: f64) {
        match self.normal_range.as_mut() {
            Some(range) => range.add(value),
            None => self.normal_range = Some(NormalRange::from_value(value)),
        }
    }
}

/// Summary of every unit observed for one local test id.
///
/// Units keep their first-registered order, which breaks ties when picking
/// the primary unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabSummary {
    pub test_id: u32,
    units: Vec<UnitSummary>,
}

impl LabSummary {
    pub fn new(test_id: u32) -> Self {
        Self {
            test_id,
            units: Vec::new(),
        }
    }

    /// Fold one quantitative observation into the running mean for `unit`.
    pub fn add(&mut self, unit: &str, value: f64) {
        self.unit_entry(unit).add(value);
    }

    /// Fold one non-abnormal observation into the normal range for `unit`.
    pub fn add_normal(&mut self, unit: &str, value: f64) {
        self.unit_entry(unit).add_normal(value);
    }

    /// Replace the statistics for `unit` with precomputed values.
    pub fn put(&mut self, summary: UnitSummary) {
        match self.units.iter_mut().find(|entry| entry.unit == summary.unit) {
            Some(existing) => *existing = summary,
            None => self.units.push(summary),
        }
    }

    pub fn unit(&self, unit: &str) -> Option<&UnitSummary> {
        self.units.iter().find(|entry| entry.unit == unit)
    }

    pub fn units(&self) -> &[UnitSummary] {
        &self.units
    }

    /// Unit with the highest count; ties go to the first registered unit.
    pub fn primary_unit(&self) -> Option<&UnitSummary> {
        let mut best: Option<&UnitSummary> = None;
        for entry in &self.units {
            if best.is_none_or(|current| entry.count > current.count) {
                best = Some(entry);
            }
        }
        best
    }

    pub fn total_count(&self) -> u64 {
        self.units.iter().map(|entry| entry.count).sum()
    }

    fn unit_entry(&mut self, unit: &str) -> &mut UnitSummary {
        let idx = match self.units.iter().position(|entry| entry.unit == unit) {
            Some(idx) => idx,
            None => {
                self.units.push(UnitSummary::new(unit));
                self.units.len() - 1
            }
        };
        &mut self.units[idx]
    }
}

fn running_mean(mean: f64, count: u64, value: f64) -> f64 {
    (mean * count as f64 + value) / (count as f64 + 1.0)
}
