//! # Common Types
//!
//! This module contains the types shared between the fetch layer and the
//! chart pipeline: the analytics payload as delivered by the backend, the
//! per-day records it carries, tooltip projections and cache statistics.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Coerce an arbitrary JSON value into a finite number.
///
/// Numbers pass through, numeric strings are parsed, booleans map to 1/0 and
/// everything else (including non-finite results) becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// One calendar day of analytics data.
///
/// Values are sparse: a category missing from `values` reads as 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DayRecord {
    /// The day in `YYYY-MM-DD` form, as sent by the backend
    pub day: String,
    /// Value per category (country, channel, ...) for this day
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl DayRecord {
    pub fn new<I, K>(day: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            day: day.into(),
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build a record from one element of the `days` array.
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let day = obj
            .get("day")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let values = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "day")
            .map(|(k, v)| (k.clone(), coerce_number(v)))
            .collect();
        Some(Self { day, values })
    }

    /// Value for a category, 0 when absent.
    pub fn value(&self, category: &str) -> f64 {
        self.values.get(category).copied().unwrap_or(0.0)
    }

    /// Parsed calendar date, if `day` is well formed.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.day, "%Y-%m-%d").ok()
    }

    /// Short axis label such as `Mar 07`; falls back to the raw string.
    pub fn label(&self) -> String {
        self.date()
            .map(|d| d.format("%b %d").to_string())
            .unwrap_or_else(|| self.day.clone())
    }
}

/// The analytics response consumed by the chart pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalyticsPayload {
    /// Backend-computed totals per category over the whole range
    pub totals: BTreeMap<String, f64>,
    /// Chronological day records
    pub days: Vec<DayRecord>,
}

impl AnalyticsPayload {
    /// Parse a payload leniently. Missing or malformed parts become empty.
    pub fn from_value(value: &Value) -> Self {
        let totals = value
            .get("totals")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), coerce_number(v)))
                    .collect()
            })
            .unwrap_or_default();

        let days = value
            .get("days")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(DayRecord::from_value).collect())
            .unwrap_or_default();

        Self { totals, days }
    }

    /// Every category mentioned in the totals or in any day, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: BTreeSet<&str> = self.totals.keys().map(String::as_str).collect();
        for day in &self.days {
            seen.extend(day.values.keys().map(String::as_str));
        }
        seen.into_iter().map(str::to_string).collect()
    }
}

/// Tooltip projection for one hovered point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    /// Index into the sampled series
    pub index: usize,
    pub day: String,
    /// Nonzero values of the active categories, in category order
    pub breakdown: Vec<(String, f64)>,
    pub total: f64,
}

/// Snapshot of the fetch layer's state, for logging and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Number of entries currently stored (expired ones included until read)
    pub cache_size: usize,
    /// Number of requests in flight
    pub pending_requests: usize,
    /// Cached keys, sorted
    pub keys: Vec<String>,
}
