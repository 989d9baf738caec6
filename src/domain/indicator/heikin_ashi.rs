//! Heikin-Ashi candle transform.
//!
//! ha_close = (open + high + low + close) / 4
//! ha_open[0] = open[0]; ha_open[i] = (ha_open[i-1] + ha_close[i-1]) / 2
//! ha_high = max(high, ha_open, ha_close); ha_low = min(low, ha_open, ha_close)
//!
//! The ha_open recurrence makes this a strict forward scan: each value
//! depends on the previous candle, so it cannot be computed out of order.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct HaCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub green: bool,
}

pub fn calculate_heikin_ashi(bars: &[Bar]) -> Vec<HaCandle> {
    let mut out: Vec<HaCandle> = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let ha_close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
        let ha_open = if i == 0 {
            bar.open
        } else {
            let prev = &out[i - 1];
            (prev.open + prev.close) / 2.0
        };
        let ha_high = bar.high.max(ha_open).max(ha_close);
        let ha_low = bar.low.min(ha_open).min(ha_close);

        out.push(HaCandle {
            open: ha_open,
            high: ha_high,
            low: ha_low,
            close: ha_close,
            green: ha_close > ha_open,
        });
    }

    out
}
