//! RSI (Relative Strength Index) over a simple rolling window.
//!
//! Gains/losses are split from one-bar close deltas, then averaged with a
//! plain n-bar rolling mean (not Wilder smoothing):
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! Zero-division convention:
//! - avg_loss == 0 and avg_gain > 0 → RSI = 100
//! - avg_loss == 0 and avg_gain == 0 (flat closes) → undefined
//!
//! Warmup: the first n bars are undefined (n deltas are needed).

use crate::domain::ohlcv::Bar;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    // Bar i uses the `period` deltas ending at delta index i-1. The sums are
    // recomputed per window: an incremental add/subtract rolling sum leaves
    // cancellation residue after large deltas age out, which can turn an
    // all-flat window into a spurious defined RSI.
    for i in period..bars.len() {
        let gain_sum: f64 = gains[i - period..i].iter().sum();
        let loss_sum: f64 = losses[i - period..i].iter().sum();

        out[i] = if loss_sum == 0.0 {
            if gain_sum == 0.0 {
                None
            } else {
                Some(100.0)
            }
        } else {
            let rs = gain_sum / loss_sum;
            Some(100.0 - (100.0 / (1.0 + rs)))
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                ticker: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn rsi_empty_and_short() {
        assert!(calculate_rsi(&[], 14).is_empty());

        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let rsi = calculate_rsi(&bars, 14);
        assert!(rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let bars = make_bars(&closes);
        let rsi = calculate_rsi(&bars, 14);

        for (i, v) in rsi.iter().enumerate().take(14) {
            assert!(v.is_none(), "bar {} should be undefined", i);
        }
        assert!(rsi[14].is_some());
        assert!(rsi[15].is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let rsi = calculate_rsi(&bars, 14);
        assert!((rsi[14].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let bars = make_bars(&closes);
        let rsi = calculate_rsi(&bars, 14);
        assert!((rsi[14].unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_closes_undefined() {
        let bars = make_bars(&[100.0; 20]);
        let rsi = calculate_rsi(&bars, 14);
        assert!(rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rsi_bounded() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + ((i as f64) * 0.7).sin() * 15.0)
            .collect();
        let bars = make_bars(&closes);
        for v in calculate_rsi(&bars, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_flat_window_after_volatile_prefix_is_undefined() {
        // cross-magnitude swings before a long flat stretch; once the window
        // holds only zero deltas the RSI must go undefined, not pick up
        // leftover floating-point residue
        let mut closes = vec![0.63, 4_329_596.5, 5_266_481.8, 0.0016, 91_793.7, 3.33];
        closes.extend(std::iter::repeat(100.0).take(16));
        let bars = make_bars(&closes);
        let rsi = calculate_rsi(&bars, 14);

        // bars 20 and 21 see fourteen flat deltas each
        assert_eq!(rsi[20], None);
        assert_eq!(rsi[21], None);
        // the last volatile delta is still inside bar 19's window
        assert!(rsi[19].is_some());
        for v in rsi.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_simple_rolling_not_wilder() {
        // 14 gains of 1.0 then one loss of 7.0: with a simple rolling mean
        // the window is 13 gains + 1 loss → RS = 13/7.
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        closes.push(closes[14] - 7.0);
        let bars = make_bars(&closes);
        let rsi = calculate_rsi(&bars, 14);

        let rs: f64 = 13.0 / 7.0;
        let expected = 100.0 - 100.0 / (1.0 + rs);
        assert_relative_eq!(rsi[15].unwrap(), expected, epsilon = 1e-9);
    }
}
