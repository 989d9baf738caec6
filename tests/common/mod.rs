#![allow(dead_code)]

use chrono::NaiveDate;
use dipscan::domain::error::DipscanError;
use dipscan::domain::ohlcv::Bar;
use dipscan::domain::position::{ExitFill, Position};
use dipscan::domain::signal::Signal;
use dipscan::ports::data_port::DataPort;
use dipscan::ports::position_store::PositionStore;
use dipscan::ports::price_port::PricePort;
use dipscan::ports::signal_store::SignalStore;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, DipscanError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DipscanError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, DipscanError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub struct MockPricePort {
    pub prices: HashMap<String, f64>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.prices.insert(ticker.to_string(), price);
        self
    }
}

impl PricePort for MockPricePort {
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, DipscanError> {
        Ok(self.prices.get(ticker).copied())
    }
}

#[derive(Default)]
pub struct MemorySignalStore {
    pub recorded: Mutex<Vec<Signal>>,
}

impl SignalStore for MemorySignalStore {
    fn record_signal(&self, signal: &Signal) -> Result<i64, DipscanError> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.push(signal.clone());
        Ok(recorded.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryPositionStore {
    pub positions: Mutex<Vec<Position>>,
}

impl MemoryPositionStore {
    pub fn get(&self, id: i64) -> Option<Position> {
        self.positions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }
}

impl PositionStore for MemoryPositionStore {
    fn open_positions(&self, auto_exit_only: bool) -> Result<Vec<Position>, DipscanError> {
        Ok(self
            .positions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_open() && (!auto_exit_only || p.auto_exit))
            .cloned()
            .collect())
    }

    fn get_position(&self, id: i64) -> Result<Option<Position>, DipscanError> {
        Ok(self.get(id))
    }

    fn insert_position(&self, position: &Position) -> Result<i64, DipscanError> {
        let mut positions = self.positions.lock().unwrap();
        let id = positions.len() as i64 + 1;
        let mut position = position.clone();
        position.id = id;
        positions.push(position);
        Ok(id)
    }

    fn settle_exit(&self, id: i64, fill: &ExitFill) -> Result<bool, DipscanError> {
        let mut positions = self.positions.lock().unwrap();
        match positions.iter_mut().find(|p| p.id == id && p.is_open()) {
            Some(p) => {
                p.apply_fill(fill);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
}

/// Flat, uneventful series: every rule stays unfired.
pub fn flat_series(ticker: &str, n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            ticker: ticker.to_string(),
            date: day(i),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
        })
        .collect()
}

/// 31 bars of steady one-point decline followed by 3 small up days on a
/// volume spike. The tail has deeply oversold RSI strictly rising for three
/// steps and final volume well above twice the 30-bar mean, so the long
/// track scores its RSI gate plus the volume spike under default thresholds.
pub fn dip_bounce_series(ticker: &str) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut close = 130.0;
    for i in 0..31 {
        let open = close;
        close -= 1.0;
        bars.push(Bar {
            ticker: ticker.to_string(),
            date: day(i),
            open,
            high: open + 0.2,
            low: close - 0.2,
            close,
            volume: 1000.0,
        });
    }
    for (j, (rise, volume)) in [(0.2, 1000.0), (0.3, 1200.0), (0.4, 5000.0)]
        .into_iter()
        .enumerate()
    {
        let open = close;
        close += rise;
        bars.push(Bar {
            ticker: ticker.to_string(),
            date: day(31 + j),
            open,
            high: close + 0.1,
            low: open - 0.1,
            close,
            volume,
        });
    }
    bars
}

pub fn write_csv_file(dir: &std::path::Path, ticker: &str, bars: &[Bar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", ticker)), content).unwrap();
}
