// Entry point and console dashboard flow.
//
// The binary presents the dashboard as a menu-driven console tool:
// - Option [1] loads and validates the daily rentals CSV.
// - Option [2] asks for a date range, recomputes every summary table over
//   the filtered records, prints the dashboard sections, and exports the
//   tables as CSV plus a JSON summary.
// - After a dashboard run, the user can go back to the menu or exit.
mod aggregate;
mod loader;
mod output;
mod types;
mod util;

use chrono::NaiveDate;
use loader::Dataset;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{RfmRow, SummaryStats};

// Simple in-memory app state so we only load the CSV once but can render
// dashboards for many date ranges in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { dataset: None }));

struct AppState {
    dataset: Option<Dataset>,
}

const DEFAULT_DATA_PATH: &str = "day_clean.csv";

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

/// Ask the user whether to go back to the menu after a dashboard run.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let resp = read_line("Back to Menu (Y/N): ").to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Prompt for one end of the date range. Empty input takes the default;
/// anything outside the dataset bounds is rejected and re-asked.
fn prompt_date(label: &str, default: NaiveDate, min: NaiveDate, max: NaiveDate) -> NaiveDate {
    loop {
        let input = read_line(&format!("{} (YYYY-MM-DD, empty = {}): ", label, default));
        if input.is_empty() {
            return default;
        }
        match util::parse_date_safe(&input) {
            Some(d) if d >= min && d <= max => return d,
            Some(_) => println!("Date must be between {} and {}.", min, max),
            None => println!("Invalid date. Please use YYYY-MM-DD."),
        }
    }
}

/// Handle option [1]: load and validate the CSV file.
///
/// On success, we store the `Dataset` in `APP_STATE` and print a short
/// summary of what was loaded.
fn handle_load(path: &str) {
    match loader::load_dataset(path) {
        Ok(dataset) => {
            println!(
                "Processing dataset... ({} daily records, {} to {})\n",
                util::format_int(dataset.records.len()),
                dataset.min_date,
                dataset.max_date
            );
            let mut state = APP_STATE.lock().unwrap();
            state.dataset = Some(dataset);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Rows of `table` re-sorted by value, descending. Presentation order
/// only; the table itself stays keyed ascending.
fn sorted_by_value_desc(table: &types::AggregatedTable) -> types::AggregatedTable {
    let mut out = table.clone();
    out.rows.sort_by(|a, b| b.value.cmp(&a.value));
    out
}

fn top5<F>(rows: &[RfmRow], cmp: F) -> Vec<RfmRow>
where
    F: FnMut(&RfmRow, &RfmRow) -> std::cmp::Ordering,
{
    let mut sorted = rows.to_vec();
    sorted.sort_by(cmp);
    sorted.truncate(5);
    sorted
}

/// Handle option [2]: prompt for a range, recompute every table over the
/// filtered records, render the dashboard, and export the results.
fn handle_dashboard() {
    let dataset = {
        let state = APP_STATE.lock().unwrap();
        state.dataset.clone()
    };
    let Some(dataset) = dataset else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    let start = prompt_date("Start date", dataset.min_date, dataset.min_date, dataset.max_date);
    let end = loop {
        let e = prompt_date("End date", dataset.max_date, dataset.min_date, dataset.max_date);
        if e < start {
            println!("End date must not precede the start date.");
        } else {
            break e;
        }
    };

    let records = dataset.filter_range(start, end);
    if records.is_empty() {
        println!(
            "\nNo records between {} and {}; the tables below will be empty.",
            start, end
        );
    }

    let daily = aggregate::daily_rent(&records);
    let daily_casual = aggregate::daily_casual_rent(&records);
    let daily_registered = aggregate::daily_registered_rent(&records);
    let season = aggregate::season_rent(&records);
    let weekday = aggregate::weekday_rent(&records);
    let workingday = aggregate::workingday_rent(&records);
    let weather = aggregate::weather_rent(&records);
    let monthly = match aggregate::monthly_rent(&records) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Monthly breakdown unavailable: {}\n", e);
            return;
        }
    };
    // Recency is measured against the whole dataset's latest date, not the
    // filtered window's, so the bound comes from the Dataset handle.
    let rfm = aggregate::rfm_by_day(&records, dataset.max_date);

    println!("\nBike Rental Dashboard");
    println!("({} to {})\n", start, end);

    println!("Daily Rentals\n");
    println!("Casual User: {}", util::format_int(daily_casual.total()));
    println!("Registered User: {}", util::format_int(daily_registered.total()));
    println!("Total User: {}\n", util::format_int(daily.total()));
    output::preview_agg(&daily, 7);
    let daily_file = "daily_rentals.csv";
    if let Err(e) = output::write_agg_csv(daily_file, &daily) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to {})\n", daily_file);

    println!("Monthly Rentals\n");
    output::preview_agg(&monthly, 12);
    let monthly_file = "monthly_rentals.csv";
    if let Err(e) = output::write_agg_csv(monthly_file, &monthly) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to {})\n", monthly_file);

    println!("Number of Users by Weather and Season\n");
    output::preview_agg(&sorted_by_value_desc(&weather), 10);
    output::preview_agg(&sorted_by_value_desc(&season), 10);

    println!("Rentals by Weekday and Working Day\n");
    output::preview_agg(&weekday, 7);
    output::preview_agg(&workingday, 2);

    println!("Best Customer Based on RFM Parameters (day)\n");
    let recencies: Vec<f64> = rfm.iter().map(|r| r.recency as f64).collect();
    let frequencies: Vec<f64> = rfm.iter().map(|r| r.frequency as f64).collect();
    let monetaries: Vec<f64> = rfm.iter().map(|r| r.monetary as f64).collect();
    let avg_recency = util::average(&recencies);
    let avg_frequency = util::average(&frequencies);
    let avg_monetary = util::average(&monetaries);
    println!("Average Recency (days): {}", util::format_number(avg_recency, 1));
    println!("Average Frequency: {}", util::format_number(avg_frequency, 2));
    println!("Average Monetary: {}\n", util::format_currency(avg_monetary));

    println!("By Recency (days)");
    output::preview_table(&top5(&rfm, |a, b| a.recency.cmp(&b.recency)), 5);
    println!("By Frequency");
    output::preview_table(&top5(&rfm, |a, b| b.frequency.cmp(&a.frequency)), 5);
    println!("By Monetary");
    output::preview_table(&top5(&rfm, |a, b| b.monetary.cmp(&a.monetary)), 5);

    let rfm_file = "rfm_by_day.csv";
    if let Err(e) = output::write_csv(rfm_file, &rfm) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to {})\n", rfm_file);

    let summary = SummaryStats {
        start_date: start,
        end_date: end,
        records: records.len(),
        casual_total: daily_casual.total(),
        registered_total: daily_registered.total(),
        rental_total: daily.total(),
        avg_recency,
        avg_frequency,
        avg_monetary,
    };
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (summary.json):");
    println!(
        "{{\"rental_total\": {}, \"avg_monetary\": {}}}\n",
        summary.rental_total,
        util::format_number(summary.avg_monetary, 2)
    );
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
    loop {
        println!("Bike Rental Dashboard");
        println!("[1] Load the dataset");
        println!("[2] Show dashboard\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&path);
            }
            "2" => {
                handle_dashboard();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
