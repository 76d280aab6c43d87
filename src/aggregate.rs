// The aggregation engine. Every function here is pure: records in, a
// derived table out, no shared state. The dashboard recomputes all of
// these from scratch whenever the user picks a new date range.
use crate::types::{AggRow, AggregatedTable, RentalRecord, RfmRow};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Canonical month order for the monthly table. Charts read this left to
/// right, so the grouped result is reindexed onto it with zero fill.
pub const ORDERED_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Error, Debug)]
pub enum AggError {
    #[error("unknown month label '{0}', expected one of Jan..Dec")]
    UnknownCategory(String),
}

/// Grouping dimension for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKey {
    Date,
    Season,
    Month,
    Weekday,
    WorkingDay,
    Weather,
}

impl AggKey {
    pub fn field(self) -> &'static str {
        match self {
            AggKey::Date => "date",
            AggKey::Season => "season",
            AggKey::Month => "month",
            AggKey::Weekday => "day",
            AggKey::WorkingDay => "workingday",
            AggKey::Weather => "weather",
        }
    }

    fn value(self, r: &RentalRecord) -> String {
        match self {
            // ISO format keeps lexical order equal to chronological order.
            AggKey::Date => r.date.format("%Y-%m-%d").to_string(),
            AggKey::Season => r.season.clone(),
            AggKey::Month => r.month.clone(),
            AggKey::Weekday => r.day.clone(),
            AggKey::WorkingDay => r.workingday.clone(),
            AggKey::Weather => r.weather.clone(),
        }
    }
}

/// Numeric column to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Casual,
    Registered,
    TotalCount,
}

impl Metric {
    pub fn field(self) -> &'static str {
        match self {
            Metric::Casual => "casual",
            Metric::Registered => "registered",
            Metric::TotalCount => "total_count",
        }
    }

    fn value(self, r: &RentalRecord) -> u64 {
        match self {
            Metric::Casual => r.casual,
            Metric::Registered => r.registered,
            Metric::TotalCount => r.total_count,
        }
    }
}

/// `Sum` adds the metric per group; `Count` tallies distinct `instant`
/// values per group (the metric column is irrelevant for counting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    Count,
}

/// Group `records` by `key` and reduce `metric` with `op`. Group keys come
/// out sorted; the set of keys is exactly the set of distinct key values in
/// the input, so an empty input yields an empty table.
pub fn aggregate(records: &[RentalRecord], key: AggKey, metric: Metric, op: AggOp) -> AggregatedTable {
    let rows = match op {
        AggOp::Sum => {
            let mut groups: BTreeMap<String, u64> = BTreeMap::new();
            for r in records {
                *groups.entry(key.value(r)).or_insert(0) += metric.value(r);
            }
            groups
                .into_iter()
                .map(|(key, value)| AggRow { key, value })
                .collect()
        }
        AggOp::Count => {
            let mut groups: BTreeMap<String, HashSet<u32>> = BTreeMap::new();
            for r in records {
                groups.entry(key.value(r)).or_default().insert(r.instant);
            }
            groups
                .into_iter()
                .map(|(key, instants)| AggRow {
                    key,
                    value: instants.len() as u64,
                })
                .collect()
        }
    };

    AggregatedTable {
        key_field: key.field(),
        metric_field: match op {
            AggOp::Sum => metric.field(),
            AggOp::Count => "count",
        },
        rows,
    }
}

pub fn daily_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Date, Metric::TotalCount, AggOp::Sum)
}

pub fn daily_casual_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Date, Metric::Casual, AggOp::Sum)
}

pub fn daily_registered_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Date, Metric::Registered, AggOp::Sum)
}

pub fn season_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Season, Metric::TotalCount, AggOp::Sum)
}

pub fn weekday_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Weekday, Metric::TotalCount, AggOp::Sum)
}

pub fn workingday_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::WorkingDay, Metric::TotalCount, AggOp::Sum)
}

pub fn weather_rent(records: &[RentalRecord]) -> AggregatedTable {
    aggregate(records, AggKey::Weather, Metric::TotalCount, AggOp::Sum)
}

/// Total rentals per month, reindexed onto [`ORDERED_MONTHS`]: always 12
/// rows in calendar order, months absent from the input carry 0. A month
/// label outside the canonical list is a data-quality problem and fails
/// loudly instead of silently producing a zero row.
pub fn monthly_rent(records: &[RentalRecord]) -> Result<AggregatedTable, AggError> {
    let grouped = aggregate(records, AggKey::Month, Metric::TotalCount, AggOp::Sum);

    let mut by_label: HashMap<String, u64> = HashMap::new();
    for row in grouped.rows {
        if !ORDERED_MONTHS.contains(&row.key.as_str()) {
            return Err(AggError::UnknownCategory(row.key));
        }
        by_label.insert(row.key, row.value);
    }

    let rows = ORDERED_MONTHS
        .iter()
        .map(|m| AggRow {
            key: m.to_string(),
            value: by_label.get(*m).copied().unwrap_or(0),
        })
        .collect();

    Ok(AggregatedTable {
        key_field: "month",
        metric_field: "total_count",
        rows,
    })
}

/// RFM ranking of weekday labels over the filtered slice.
///
/// `reference_date` must be the max date of the *entire* loaded dataset,
/// not of the filtered slice: a weekday whose last filtered occurrence is
/// long before the end of the dataset gets a large recency even when the
/// filter window ends right after it. The caller passes the value in so
/// nothing here reaches back to the full dataset.
pub fn rfm_by_day(records: &[RentalRecord], reference_date: NaiveDate) -> Vec<RfmRow> {
    #[derive(Default)]
    struct Acc {
        instants: HashSet<u32>,
        monetary: u64,
        max_date: Option<NaiveDate>,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for r in records {
        let acc = groups.entry(r.day.clone()).or_default();
        acc.instants.insert(r.instant);
        acc.monetary += r.total_count;
        acc.max_date = Some(acc.max_date.map_or(r.date, |d| d.max(r.date)));
    }

    groups
        .into_iter()
        .filter_map(|(day, acc)| {
            // A group without a reducible max date has no rows at all and
            // is omitted rather than reported.
            let max_date = acc.max_date?;
            Some(RfmRow {
                day,
                recency: (reference_date - max_date).num_days(),
                frequency: acc.instants.len() as u64,
                monetary: acc.monetary,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(
        instant: u32,
        date: NaiveDate,
        month: &str,
        day: &str,
        casual: u64,
        registered: u64,
    ) -> RentalRecord {
        RentalRecord {
            instant,
            date,
            season: "Winter".to_string(),
            month: month.to_string(),
            day: day.to_string(),
            workingday: "Workingday".to_string(),
            weather: "Clear".to_string(),
            casual,
            registered,
            total_count: casual + registered,
        }
    }

    fn scenario() -> Vec<RentalRecord> {
        vec![
            rec(1, d(2024, 1, 1), "Jan", "Mon", 5, 10),
            rec(2, d(2024, 1, 8), "Jan", "Mon", 2, 3),
            rec(3, d(2024, 2, 1), "Feb", "Thu", 1, 1),
        ]
    }

    #[test]
    fn daily_casual_plus_registered_equals_total() {
        let records = scenario();
        let total = daily_rent(&records);
        let casual = daily_casual_rent(&records);
        let registered = daily_registered_rent(&records);

        assert_eq!(total.rows.len(), 3);
        for (i, row) in total.rows.iter().enumerate() {
            assert_eq!(row.key, casual.rows[i].key);
            assert_eq!(row.key, registered.rows[i].key);
            assert_eq!(row.value, casual.rows[i].value + registered.rows[i].value);
        }
    }

    #[test]
    fn date_keys_are_chronological() {
        let mut records = scenario();
        records.reverse();
        let table = daily_rent(&records);
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-08", "2024-02-01"]);
    }

    #[test]
    fn sum_is_conserved_across_groups() {
        let records = scenario();
        let ungrouped: u64 = records.iter().map(|r| r.total_count).sum();
        for table in [
            daily_rent(&records),
            season_rent(&records),
            weekday_rent(&records),
            workingday_rent(&records),
            weather_rent(&records),
        ] {
            assert_eq!(table.total(), ungrouped);
        }
    }

    #[test]
    fn monthly_has_twelve_rows_in_calendar_order() {
        let records = scenario();
        let table = monthly_rent(&records).unwrap();

        assert_eq!(table.rows.len(), 12);
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ORDERED_MONTHS.to_vec());

        assert_eq!(table.rows[0].value, 20); // Jan
        assert_eq!(table.rows[1].value, 2); // Feb
        assert!(table.rows[2..].iter().all(|r| r.value == 0));
    }

    #[test]
    fn monthly_of_empty_input_is_all_zero() {
        let table = monthly_rent(&[]).unwrap();
        assert_eq!(table.rows.len(), 12);
        assert!(table.rows.iter().all(|r| r.value == 0));
    }

    #[test]
    fn monthly_rejects_unknown_label() {
        let records = vec![rec(1, d(2024, 1, 1), "January", "Mon", 5, 10)];
        let err = monthly_rent(&records).unwrap_err();
        assert!(matches!(err, AggError::UnknownCategory(l) if l == "January"));
    }

    #[test]
    fn rfm_scenario_full_range() {
        let records = scenario();
        let rows = rfm_by_day(&records, d(2024, 2, 1));
        assert_eq!(rows.len(), 2);

        let mon = rows.iter().find(|r| r.day == "Mon").unwrap();
        assert_eq!(mon.frequency, 2);
        assert_eq!(mon.monetary, 20);
        assert_eq!(mon.recency, 24);

        let thu = rows.iter().find(|r| r.day == "Thu").unwrap();
        assert_eq!(thu.frequency, 1);
        assert_eq!(thu.monetary, 2);
        assert_eq!(thu.recency, 0);
    }

    #[test]
    fn rfm_recency_uses_dataset_wide_reference() {
        // Dataset spans day 1..100; the filter keeps day 1..50 and the
        // weekday last occurs on day 45. Recency must be 100-45, not 50-45.
        let full_max = d(2024, 4, 9); // day 100 of 2024
        let filtered = vec![rec(1, d(2024, 2, 14), "Feb", "Wed", 1, 1)]; // day 45

        let rows = rfm_by_day(&filtered, full_max);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recency, 55);
    }

    #[test]
    fn count_op_tallies_distinct_instants() {
        let records = scenario();
        let table = aggregate(&records, AggKey::Weekday, Metric::TotalCount, AggOp::Count);
        assert_eq!(table.metric_field, "count");
        let mon = table.rows.iter().find(|r| r.key == "Mon").unwrap();
        assert_eq!(mon.value, 2);
        let thu = table.rows.iter().find(|r| r.key == "Thu").unwrap();
        assert_eq!(thu.value, 1);
    }

    #[test]
    fn empty_input_yields_empty_tables() {
        assert!(daily_rent(&[]).rows.is_empty());
        assert!(season_rent(&[]).rows.is_empty());
        assert!(weather_rent(&[]).rows.is_empty());
        assert!(rfm_by_day(&[], d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = scenario();
        assert_eq!(daily_rent(&records), daily_rent(&records));
        assert_eq!(monthly_rent(&records).unwrap(), monthly_rent(&records).unwrap());
        assert_eq!(
            rfm_by_day(&records, d(2024, 2, 1)),
            rfm_by_day(&records, d(2024, 2, 1))
        );
    }
}
