//! Simple moving average over closing prices.
//!
//! SMA(n)[i] = mean(close[i-n+1..=i]).
//! Warmup: the first (n-1) bars are undefined.

use crate::domain::ohlcv::Bar;

/// Rolling mean of the closes. `None` until a full window exists.
pub fn calculate_sma(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean_of(bars.iter().map(|b| b.close), bars.len(), period)
}

/// Rolling mean over an arbitrary value stream. Shared with the volume
/// statistics module.
pub fn rolling_mean_of(
    values: impl Iterator<Item = f64>,
    len: usize,
    period: usize,
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(len);
    if period == 0 {
        out.resize(len, None);
        return out;
    }

    let mut window_sum = 0.0;
    let mut buf: Vec<f64> = Vec::with_capacity(len);

    for (i, v) in values.enumerate() {
        buf.push(v);
        window_sum += v;
        if i >= period {
            window_sum -= buf[i - period];
        }
        if i + 1 >= period {
            out.push(Some(window_sum / period as f64));
        } else {
            out.push(None);
        }
    }

    out
}
