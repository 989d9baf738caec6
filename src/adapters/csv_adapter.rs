//! CSV file data adapter.
//!
//! One file per ticker (`{TICKER}.csv`) with columns
//! `date,open,high,low,close,volume`, date formatted `%Y-%m-%d`, oldest row
//! first. Doubles as the import path for seeding the database.

use crate::domain::error::DipscanError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

/// Parse one ticker's bar file. Rows must be in chronological order.
pub fn read_bars(path: &Path, ticker: &str) -> Result<Vec<Bar>, DipscanError> {
    let csv_err = |reason: String| DipscanError::Csv {
        path: path.display().to_string(),
        reason,
    };

    let mut rdr = csv::Reader::from_path(path).map_err(|e| csv_err(e.to_string()))?;
    let mut bars = Vec::new();
    let mut prev_date: Option<NaiveDate> = None;

    for result in rdr.records() {
        let record = result.map_err(|e| csv_err(e.to_string()))?;

        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .ok_or_else(|| csv_err(format!("missing {} column", name)))
        };

        let date = NaiveDate::parse_from_str(field(0, "date")?, "%Y-%m-%d")
            .map_err(|e| csv_err(format!("invalid date: {}", e)))?;

        if let Some(prev) = prev_date {
            if date <= prev {
                return Err(csv_err(format!("rows out of order at {}", date)));
            }
        }
        prev_date = Some(date);

        let parse_f64 = |idx: usize, name: &str| -> Result<f64, DipscanError> {
            field(idx, name)?
                .parse()
                .map_err(|e| csv_err(format!("invalid {}: {}", name, e)))
        };

        bars.push(Bar {
            ticker: ticker.to_string(),
            date,
            open: parse_f64(1, "open")?,
            high: parse_f64(2, "high")?,
            low: parse_f64(3, "low")?,
            close: parse_f64(4, "close")?,
            volume: parse_f64(5, "volume")?,
        });
    }

    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, DipscanError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            return Err(DipscanError::NoData {
                ticker: ticker.to_string(),
            });
        }
        read_bars(&path, ticker)
    }

    fn list_tickers(&self) -> Result<Vec<String>, DipscanError> {
        let mut tickers = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    tickers.push(stem.to_string());
                }
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}
