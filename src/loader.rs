use crate::types::{RawRow, RentalRecord};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashSet;
use thiserror::Error;

/// Columns the source file must carry. Anything else (temperature,
/// humidity, ...) is ignored.
const REQUIRED_COLUMNS: [&str; 10] = [
    "instant",
    "date",
    "season",
    "month",
    "day",
    "workingday",
    "weather",
    "casual",
    "registered",
    "total_count",
];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open { path: String, source: csv::Error },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("no data rows in source file")]
    Empty,
    #[error("line {line}: {reason}")]
    Row { line: usize, reason: String },
}

/// The loaded dataset: an immutable record vector plus the dataset-wide
/// date bounds. `max_date` doubles as the RFM reference date, so it is
/// computed here once and never re-derived from a filtered slice.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<RentalRecord>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}

impl Dataset {
    /// Records with `start <= date <= end`, in load order. An empty result
    /// is not an error; the caller decides how to present it.
    pub fn filter_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<RentalRecord> {
        self.records
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect()
    }
}

/// Load and validate the daily records file. Unlike a dirty-data cleaner
/// this refuses to skip rows: the input is supposed to be pre-cleaned, so
/// any malformed row aborts the load rather than producing partial data.
pub fn load_dataset(path: &str) -> Result<Dataset, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| LoadError::Open {
            path: path.to_string(),
            source: e,
        })?;

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col.to_string()));
        }
    }

    let mut records: Vec<RentalRecord> = Vec::new();
    let mut seen_instants: HashSet<u32> = HashSet::new();

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // Header occupies line 1; data starts at line 2.
        let line = idx + 2;
        let row = result?;

        let instant = parse_u32(line, "instant", row.instant)?;
        if !seen_instants.insert(instant) {
            return Err(LoadError::Row {
                line,
                reason: format!("duplicate instant {}", instant),
            });
        }

        let date_raw = required(line, "date", row.date)?;
        let date = NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d").map_err(|_| {
            LoadError::Row {
                line,
                reason: format!("unparsable date '{}'", date_raw),
            }
        })?;

        let casual = parse_u64(line, "casual", row.casual)?;
        let registered = parse_u64(line, "registered", row.registered)?;
        let total_count = parse_u64(line, "total_count", row.total_count)?;
        if total_count != casual + registered {
            return Err(LoadError::Row {
                line,
                reason: format!(
                    "total_count {} != casual {} + registered {}",
                    total_count, casual, registered
                ),
            });
        }

        records.push(RentalRecord {
            instant,
            date,
            season: required(line, "season", row.season)?,
            month: required(line, "month", row.month)?,
            day: required(line, "day", row.day)?,
            workingday: required(line, "workingday", row.workingday)?,
            weather: required(line, "weather", row.weather)?,
            casual,
            registered,
            total_count,
        });
    }

    let min_date = records.iter().map(|r| r.date).min().ok_or(LoadError::Empty)?;
    let max_date = records.iter().map(|r| r.date).max().ok_or(LoadError::Empty)?;

    Ok(Dataset {
        records,
        min_date,
        max_date,
    })
}

fn required(line: usize, name: &str, value: Option<String>) -> Result<String, LoadError> {
    let v = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if v.is_empty() {
        return Err(LoadError::Row {
            line,
            reason: format!("empty value for '{}'", name),
        });
    }
    Ok(v)
}

fn parse_u32(line: usize, name: &str, value: Option<String>) -> Result<u32, LoadError> {
    let v = required(line, name, value)?;
    v.parse::<u32>().map_err(|_| LoadError::Row {
        line,
        reason: format!("'{}' is not a valid {} value", v, name),
    })
}

fn parse_u64(line: usize, name: &str, value: Option<String>) -> Result<u64, LoadError> {
    let v = required(line, name, value)?;
    v.parse::<u64>().map_err(|_| LoadError::Row {
        line,
        reason: format!("'{}' is not a valid {} value", v, name),
    })
}
