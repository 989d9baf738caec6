//! Rolling volume statistics: n-bar mean, sample standard deviation and
//! z-score of the current bar's volume.
//!
//! z = (volume - mean) / std; undefined while the window is short and
//! whenever std == 0 (uniform volume).

use crate::domain::indicator::sma::rolling_mean_of;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub z: Option<f64>,
}

pub fn calculate_volume_stats(bars: &[Bar], period: usize) -> Vec<VolumeStats> {
    let means = rolling_mean_of(bars.iter().map(|b| b.volume), bars.len(), period);
    let mut out = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let Some(mean) = means[i] else {
            out.push(VolumeStats::default());
            continue;
        };

        // sample std over the same window (period >= 2 whenever mean is set
        // and std is meaningful)
        let std = if period < 2 {
            None
        } else {
            let window = &bars[i + 1 - period..=i];
            let var = window
                .iter()
                .map(|b| {
                    let d = b.volume - mean;
                    d * d
                })
                .sum::<f64>()
                / (period - 1) as f64;
            Some(var.sqrt())
        };

        let z = match std {
            Some(s) if s > 0.0 => Some((bar.volume - mean) / s),
            _ => None,
        };

        out.push(VolumeStats {
            mean: Some(mean),
            std,
            z,
        });
    }

    out
}
