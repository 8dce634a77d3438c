use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user's career data: an opaque key/value tree (personal_info, experience,
/// education, skills, certifications, projects, ...). Never mutated by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth(Value);

impl GroundTruth {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Section as an array, or `[]` when absent or not an array.
    pub fn list(&self, key: &str) -> Vec<Value> {
        match self.section(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Section verbatim, or `{}` when absent.
    pub fn object_or_empty(&self, key: &str) -> Value {
        self.section(key)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Total years across `experience[]` entries.
    ///
    /// Dates are `YYYY-MM`; an empty, `present` or `current` end date counts
    /// until `today`. Entries without a parseable start are skipped.
    pub fn experience_years(&self, today: NaiveDate) -> f64 {
        self.list("experience")
            .iter()
            .filter_map(|job| {
                let start = parse_year_month(job.get("start_date")?.as_str()?)?;
                let end = match job.get("end_date").and_then(Value::as_str).map(str::trim) {
                    Some(raw) if !is_open_ended(raw) => parse_year_month(raw)?,
                    _ => today,
                };
                let years = (end - start).num_days() as f64 / 365.25;
                Some(years.max(0.0))
            })
            .sum()
    }
}

fn is_open_ended(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("present") || raw.eq_ignore_ascii_case("current")
}

fn parse_year_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}
