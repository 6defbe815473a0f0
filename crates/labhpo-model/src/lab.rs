use chrono::NaiveDateTime;

/// Flag substring that marks a result as outside the reporting lab's range.
pub const ABNORMAL_FLAG: &str = "abnormal";

/// Placeholder unit used when a result carries no unit of measure.
pub const UNKNOWN_UNIT: &str = "?";

/// One raw lab result as parsed from an external record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLabResult {
    pub row_id: u64,
    pub subject_id: u64,
    pub admission_id: Option<u64>,
    /// Local (site-specific) test identifier.
    pub test_id: u32,
    pub charted_at: Option<NaiveDateTime>,
    /// Textual value as reported.
    pub value: String,
    pub value_num: Option<f64>,
    /// Unit of measure, already normalized with [`normalize_unit`].
    pub unit: String,
    pub flag: String,
}

impl RawLabResult {
    /// Numeric value of the result, falling back to the textual value when it
    /// parses as a finite number.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value_num.or_else(|| {
            self.value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
        })
    }

    pub fn is_flagged_abnormal(&self) -> bool {
        is_abnormal_flag(&self.flag)
    }
}

/// Case-insensitive substring match for the "abnormal" flag.
pub fn is_abnormal_flag(flag: &str) -> bool {
    flag.to_lowercase().contains(ABNORMAL_FLAG)
}

/// Normalize a unit of measure: trim, drop double quotes, lower-case, and
/// replace an empty unit with [`UNKNOWN_UNIT`].
pub fn normalize_unit(raw: &str) -> String {
    let cleaned = raw.replace('"', "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        UNKNOWN_UNIT.to_string()
    } else {
        trimmed.to_lowercase()
    }
}
