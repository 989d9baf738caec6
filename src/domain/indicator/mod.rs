//! Indicator pipeline: OHLCV bars in, enriched bars out.
//!
//! Each indicator lives in its own module and returns a series parallel to
//! the input; [`enrich`] zips them into [`EnrichedBar`]s. All warmup gaps are
//! explicit `None`s — a missing value is never substituted with zero.

pub mod sma;
pub mod rsi;
pub mod atr;
pub mod heikin_ashi;
pub mod volume;

use crate::domain::ohlcv::Bar;

pub use atr::calculate_atr;
pub use heikin_ashi::{calculate_heikin_ashi, HaCandle};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use volume::{calculate_volume_stats, VolumeStats};

pub const SMA_SHORT: usize = 20;
pub const SMA_MID: usize = 50;
pub const SMA_LONG: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_WINDOW: usize = 30;

/// A bar plus every derived column the scoring engine consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub rsi14: Option<f64>,
    pub atr14: Option<f64>,
    pub ha: HaCandle,
    pub vol_mean30: Option<f64>,
    pub vol_std30: Option<f64>,
    pub vol_z: Option<f64>,
}

/// Run the full pipeline over an ordered bar history. Deterministic, pure,
/// order-preserving; an empty history yields an empty result.
/// `volume_period` sets the rolling window for the volume statistics
/// (strategy-configurable; [`VOLUME_WINDOW`] is the default).
pub fn enrich(bars: &[Bar], volume_period: usize) -> Vec<EnrichedBar> {
    let sma20 = sma::calculate_sma(bars, SMA_SHORT);
    let sma50 = sma::calculate_sma(bars, SMA_MID);
    let sma200 = sma::calculate_sma(bars, SMA_LONG);
    let rsi14 = rsi::calculate_rsi(bars, RSI_PERIOD);
    let atr14 = atr::calculate_atr(bars, ATR_PERIOD);
    let ha = heikin_ashi::calculate_heikin_ashi(bars);
    let vol = volume::calculate_volume_stats(bars, volume_period);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| EnrichedBar {
            bar: bar.clone(),
            sma20: sma20[i],
            sma50: sma50[i],
            sma200: sma200[i],
            rsi14: rsi14[i],
            atr14: atr14[i],
            ha: ha[i].clone(),
            vol_mean30: vol[i].mean,
            vol_std30: vol[i].std,
            vol_z: vol[i].z,
        })
        .collect()
}
