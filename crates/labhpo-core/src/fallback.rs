//! Textual fallbacks for quantitative tests reported as free text.
//!
//! Some quantitative tests never produce a numeric value and so never get a
//! summary. For a known set of local tests the textual value still carries a
//! direction; the table below captures those as data.

use std::collections::BTreeMap;

use labhpo_model::InterpretationCode;

/// One `needle -> interpretation` pattern, checked against the upper-cased value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPattern {
    pub needle: String,
    pub interpretation: InterpretationCode,
}

/// Per-test patterns, tried in order. A test present with no patterns is a
/// known corner case that cannot be interpreted from text at all.
#[derive(Debug, Clone)]
pub struct TextualFallbacks {
    rules: BTreeMap<u32, Vec<FallbackPattern>>,
}

impl TextualFallbacks {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Register a pattern for `test_id`. Patterns match by substring.
    pub fn with_pattern(
        mut self,
        test_id: u32,
        needle: &str,
        interpretation: InterpretationCode,
    ) -> Self {
        self.rules.entry(test_id).or_default().push(FallbackPattern {
            needle: needle.to_uppercase(),
            interpretation,
        });
        self
    }

    /// Register a test that is known to be uninterpretable from text.
    pub fn with_known_test(mut self, test_id: u32) -> Self {
        self.rules.entry(test_id).or_default();
        self
    }

    pub fn interpret(&self, test_id: u32, value: &str) -> Option<InterpretationCode> {
        let patterns = self.rules.get(&test_id)?;
        let value = value.to_uppercase();
        patterns
            .iter()
            .find(|pattern| value.contains(&pattern.needle))
            .map(|pattern| pattern.interpretation)
    }

    pub fn covers(&self, test_id: u32) -> bool {
        self.rules.contains_key(&test_id)
    }
}

impl Default for TextualFallbacks {
    /// Manual platelet count (51266) reports `HIGH`, `LOW` or `RARE`.
    /// Estimated GFR (50920) only ever says "see comments".
    fn default() -> Self {
        Self::empty()
            .with_pattern(51266, "HIGH", InterpretationCode::High)
            .with_pattern(51266, "LOW", InterpretationCode::Low)
            .with_pattern(51266, "RARE", InterpretationCode::Low)
            .with_known_test(50920)
    }
}
