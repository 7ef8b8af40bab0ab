// File: src/data.rs
//
// Synthetic daily price data in the shape the benchmark suite expects:
// one random walk per ticker over business days, written as CSV.

use crate::errors::{BenchError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_TICKERS: [&str; 2] = ["tsla", "msft"];
pub const DEFAULT_START: &str = "2024-01-01";
/// Exclusive
pub const DEFAULT_END: &str = "2024-02-26";
pub const DEFAULT_SEED: u64 = 2024;

/// Share of rows whose Close is left empty
const NULL_CLOSE_RATE: f64 = 0.02;
const MAX_DAILY_MOVE: f64 = 0.04;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: Option<f64>,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Ticker")]
    pub ticker: String,
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
        BenchError::config(format!("Invalid date '{}': {}", text, e)).with_help("use YYYY-MM-DD")
    })
}

/// Weekdays in `[start, end)`
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Rows are grouped by ticker, in the order given, then by date.
/// The same seed always produces the same rows.
pub fn generate_prices(tickers: &[&str], start: NaiveDate, end: NaiveDate, seed: u64) -> Vec<PriceRow> {
    let days = business_days(start, end);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(days.len() * tickers.len());

    for ticker in tickers {
        let mut price: f64 = rng.gen_range(50.0..400.0);
        for day in &days {
            let open = price;
            let close = open * (1.0 + rng.gen_range(-MAX_DAILY_MOVE..MAX_DAILY_MOVE));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));
            let missing = rng.gen_bool(NULL_CLOSE_RATE);

            rows.push(PriceRow {
                date: day.format("%Y-%m-%d").to_string(),
                open: round_cents(open),
                high: round_cents(high),
                low: round_cents(low),
                close: if missing { None } else { Some(round_cents(close)) },
                adj_close: round_cents(close * 0.995),
                volume: rng.gen_range(1_000_000..150_000_000),
                ticker: ticker.to_string(),
            });
            price = close;
        }
    }

    rows
}

/// The default data set: both tickers over the default date range
pub fn generate_default(seed: u64) -> Result<Vec<PriceRow>> {
    let start = parse_date(DEFAULT_START)?;
    let end = parse_date(DEFAULT_END)?;
    Ok(generate_prices(&DEFAULT_TICKERS, start, end, seed))
}

pub fn write_csv(rows: &[PriceRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::debug!(target: "frame_duel::data", path = %path.display(), rows = rows.len(), "prices written");
    Ok(())
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{ColumnFrame, ReadEngine, RowFrame};

    #[test]
    fn test_business_days_skip_weekends() {
        let days = business_days(parse_date("2024-01-01").unwrap(), parse_date("2024-02-26").unwrap());
        assert_eq!(days.len(), 40);
        assert_eq!(days[0], parse_date("2024-01-01").unwrap());
        assert_eq!(days[days.len() - 1], parse_date("2024-02-23").unwrap());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate_default(7).unwrap();
        let b = generate_default(7).unwrap();
        let c = generate_default(8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 80);
        assert_eq!(a[0].ticker, "tsla");
        assert_eq!(a[79].ticker, "msft");
    }

    #[test]
    fn test_rows_are_consistent() {
        for row in generate_default(DEFAULT_SEED).unwrap() {
            assert!(row.low <= row.high);
            assert!(row.low <= row.open && row.open <= row.high);
            if let Some(close) = row.close {
                assert!(row.low <= close && close <= row.high);
            }
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn test_written_csv_loads_in_both_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.csv");
        let mut rows = generate_default(1).unwrap();
        rows[3].close = None;
        write_csv(&rows, &path).unwrap();

        let row_frame = RowFrame::read_csv(&path, ReadEngine::Default).unwrap();
        let column_frame = ColumnFrame::read_csv(&path).unwrap();
        assert_eq!(row_frame.height(), 80);
        assert_eq!(column_frame.height(), 80);
        assert_eq!(
            row_frame.columns(),
            ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume", "Ticker"]
        );
        assert!(row_frame.get(3, "Close").unwrap().is_null());
        assert!(column_frame.column("Close").unwrap().null_count() >= 1);
    }
}
