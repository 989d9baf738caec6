//! OHLCV bar representation.

use chrono::NaiveDate;

/// One daily bar for one instrument. Ordered chronologically per ticker,
/// one bar per date.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}
