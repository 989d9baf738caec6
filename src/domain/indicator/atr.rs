//! ATR (Average True Range) over a simple rolling window.
//!
//! TR[0] = high - low (no previous close yet);
//! TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR(n) = n-bar rolling mean of TR; the first (n-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean_of;
use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    rolling_mean_of(tr.into_iter(), bars.len(), period)
}
