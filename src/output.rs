use crate::types::AggregatedTable;
use serde::Serialize;
use std::error::Error;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// CSV export for an [`AggregatedTable`]. Its column names are runtime
/// values, so the header row is written by hand instead of via serde.
pub fn write_agg_csv(path: &str, table: &AggregatedTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([table.key_field, table.metric_field])?;
    for row in &table.rows {
        wtr.write_record([row.key.as_str(), &row.value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Markdown preview of an [`AggregatedTable`], headed by its own column
/// names.
pub fn preview_agg(table: &AggregatedTable, max_rows: usize) {
    if table.rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record([table.key_field, table.metric_field]);
    for row in table.rows.iter().take(max_rows) {
        builder.push_record([row.key.clone(), row.value.to_string()]);
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    println!("{}\n", rendered);
}
