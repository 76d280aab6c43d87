use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Raw CSV view of one row of `day_clean.csv`. Everything is optional and
/// stringly-typed here; the loader validates and converts into
/// [`RentalRecord`]. Columns we never aggregate on (temp, hum, ...) are
/// simply not listed and ignored by serde.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub instant: Option<String>,
    pub date: Option<String>,
    pub season: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub workingday: Option<String>,
    pub weather: Option<String>,
    pub casual: Option<String>,
    pub registered: Option<String>,
    pub total_count: Option<String>,
}

/// One validated daily record. Immutable once loaded; the loader guarantees
/// `total_count == casual + registered` and that `instant` is unique.
#[derive(Debug, Clone)]
pub struct RentalRecord {
    pub instant: u32,
    pub date: NaiveDate,
    pub season: String,
    pub month: String,
    pub day: String,
    pub workingday: String,
    pub weather: String,
    pub casual: u64,
    pub registered: u64,
    pub total_count: u64,
}

/// One group of an aggregation: a categorical key and its summed (or
/// counted) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggRow {
    pub key: String,
    pub value: u64,
}

/// A grouped summary table. `key_field` and `metric_field` carry the column
/// names so previews and CSV exports can label themselves; rows are ordered
/// by key (dates ascend because keys are `YYYY-MM-DD` strings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedTable {
    pub key_field: &'static str,
    pub metric_field: &'static str,
    pub rows: Vec<AggRow>,
}

impl AggregatedTable {
    /// Sum of all group values. For a sum aggregation this equals the
    /// ungrouped metric total.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.value).sum()
    }
}

/// RFM ranking row for one weekday label: how recently it last occurred
/// (days before the dataset-wide max date), how many records it has, and
/// how many rentals it accounts for.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct RfmRow {
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Recency (days)")]
    pub recency: i64,
    #[tabled(rename = "Frequency")]
    pub frequency: u64,
    #[tabled(rename = "Monetary")]
    pub monetary: u64,
}

/// Headline metrics written to `summary.json` after each dashboard run.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub records: usize,
    pub casual_total: u64,
    pub registered_total: u64,
    pub rental_total: u64,
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
}
