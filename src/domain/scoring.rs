//! Two-track rule scoring over an enriched bar series.
//!
//! Each evaluation scores the latest bar twice — a LONG track (oversold
//! bounce) and a SHORT track (overbought fade) — and the strictly higher
//! score wins if it clears the Low confidence floor. Every filter threshold
//! is optional: `None` disables the rule, which then contributes nothing and
//! never disqualifies the track.
//!
//! Evaluation order per track (reasons are recorded in this order):
//! 1. RSI gate: extreme RSI plus a strict directional run. +40.
//!    When enabled, a failing gate zeroes the track.
//! 2. Heikin-Ashi confirmation: consecutive same-color candles with strictly
//!    trending closes. +20.
//! 3. Volume confirmation: spike above multiplier × rolling mean (+15), else
//!    z-score above 1.0 (+10).
//! 4. Trend filter: close on the right side of SMA-200. +10.
//!
//! The LONG track additionally carries a trend-damage veto: price too far
//! below SMA-200 suppresses the track outright. The SHORT track has no
//! mirror veto (kept as observed in the source strategy).

use chrono::{DateTime, Utc};

use crate::domain::indicator::{EnrichedBar, VOLUME_WINDOW};
use crate::domain::signal::{Confidence, Direction, Signal, SCORE_LOW};
use crate::ports::config_port::ConfigPort;

pub const SCORE_RSI_GATE: i32 = 40;
pub const SCORE_HA_CONFIRM: i32 = 20;
pub const SCORE_VOLUME_HIGH: i32 = 15;
pub const SCORE_VOLUME_MED: i32 = 10;
pub const SCORE_TREND_FILTER: i32 = 10;

/// z-score floor for the medium volume tier.
pub const VOLUME_Z_FLOOR: f64 = 1.0;

/// Strategy thresholds and windows. `None` on any filter value means the
/// rule is skipped entirely — distinct from zero, which would still compare.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub rsi_oversold: Option<f64>,
    pub rsi_overbought: Option<f64>,
    /// Strictly rising/falling RSI run length required by the gate.
    pub rsi_confirm_span: Option<usize>,
    /// Consecutive Heikin-Ashi candles required for confirmation.
    pub ha_confirm_count: Option<usize>,
    pub volume_multiplier: Option<f64>,
    /// LONG-only veto: max percent the close may sit below SMA-200.
    pub max_below_sma200_pct: Option<f64>,
    /// Upper bound on `confirm_window`; the confirmation suffix is carved
    /// from the last `primary_window` bars, so with validation enforcing
    /// `confirm_window <= primary_window` this only bounds the other knob.
    pub primary_window: usize,
    pub confirm_window: usize,
    /// Rolling window for the volume mean/std the volume rule compares
    /// against.
    pub volume_avg_period: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            rsi_oversold: Some(35.0),
            rsi_overbought: Some(70.0),
            rsi_confirm_span: Some(3),
            ha_confirm_count: Some(2),
            volume_multiplier: Some(2.0),
            max_below_sma200_pct: None,
            primary_window: 70,
            confirm_window: 30,
            volume_avg_period: VOLUME_WINDOW,
        }
    }
}

/// Non-negative counter from INI. Negative values collapse to 0 so that
/// validation rejects them instead of a cast wrapping them huge.
fn ini_usize(config: &dyn ConfigPort, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int("strategy", key, default as i64)).unwrap_or(0)
}

impl StrategyConfig {
    /// Read the `[strategy]` section. Absent keys fall back to defaults;
    /// the literal `off` disables a filter.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let d = StrategyConfig::default();
        StrategyConfig {
            rsi_oversold: config.get_opt_double("strategy", "rsi_oversold", d.rsi_oversold),
            rsi_overbought: config.get_opt_double("strategy", "rsi_overbought", d.rsi_overbought),
            rsi_confirm_span: config
                .get_opt_int("strategy", "rsi_confirm_span", Some(3))
                .map(|v| usize::try_from(v).unwrap_or(0)),
            ha_confirm_count: config
                .get_opt_int("strategy", "ha_confirm_count", Some(2))
                .map(|v| usize::try_from(v).unwrap_or(0)),
            volume_multiplier: config.get_opt_double(
                "strategy",
                "volume_multiplier",
                d.volume_multiplier,
            ),
            max_below_sma200_pct: config.get_opt_double(
                "strategy",
                "max_below_sma200_pct",
                d.max_below_sma200_pct,
            ),
            primary_window: ini_usize(config, "primary_window", d.primary_window),
            confirm_window: ini_usize(config, "confirm_window", d.confirm_window),
            volume_avg_period: ini_usize(config, "volume_avg_period", d.volume_avg_period),
        }
    }
}

/// Score the latest bar of `series`. Degrades gracefully on short histories:
/// windows and runs clamp to the bars available, and undefined indicator
/// values simply leave their rules unfired. Never fails.
pub fn evaluate(
    ticker: &str,
    series: &[EnrichedBar],
    config: &StrategyConfig,
    generated_at: DateTime<Utc>,
) -> Signal {
    let Some(last) = series.last() else {
        return Signal::neutral(ticker, generated_at);
    };

    // primary window gives trend context, the confirmation suffix carries
    // the short-term momentum checks
    let primary = &series[series.len().saturating_sub(config.primary_window)..];
    let confirm = &primary[primary.len().saturating_sub(config.confirm_window)..];

    let (long_score, long_reasons) = score_track(true, last, confirm, config);
    let (short_score, short_reasons) = score_track(false, last, confirm, config);

    let (score, direction, reasons) = if long_score >= SCORE_LOW && long_score > short_score {
        (long_score, Direction::Long, long_reasons)
    } else if short_score >= SCORE_LOW && short_score > long_score {
        (short_score, Direction::Short, short_reasons)
    } else {
        // ties and sub-floor scores are no-trades
        (0, Direction::Neutral, Vec::new())
    };

    Signal {
        ticker: ticker.to_string(),
        generated_at,
        rsi: last.rsi14,
        atr: last.atr14,
        score,
        confidence: Confidence::from_score(score),
        direction,
        reasons,
    }
}

fn score_track(
    long: bool,
    last: &EnrichedBar,
    confirm: &[EnrichedBar],
    config: &StrategyConfig,
) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    // Trend-damage veto, LONG only: a close too far below SMA-200 means a
    // broken trend, and the bounce setup is off regardless of the other rules.
    if long {
        if let (Some(limit), Some(sma200)) = (config.max_below_sma200_pct, last.sma200) {
            let below_pct = (sma200 - last.bar.close) / sma200 * 100.0;
            if below_pct > limit {
                return (0, Vec::new());
            }
        }
    }

    // Rule 1: RSI gate. When enabled, the remaining rules only accumulate
    // under a passing gate.
    let threshold = if long {
        config.rsi_oversold
    } else {
        config.rsi_overbought
    };
    if let Some(th) = threshold {
        let run_ok = match config.rsi_confirm_span {
            Some(span) => rsi_run(confirm, span, long),
            None => true,
        };
        match last.rsi14 {
            Some(rsi) if run_ok && (if long { rsi < th } else { rsi > th }) => {
                score += SCORE_RSI_GATE;
                reasons.push(if long {
                    format!("Oversold RSI turning upward (RSI {:.1})", rsi)
                } else {
                    format!("Overbought RSI rolling over (RSI {:.1})", rsi)
                });
            }
            _ => return (0, Vec::new()),
        }
    }

    // Rule 2: Heikin-Ashi confirmation.
    if let Some(count) = config.ha_confirm_count {
        if ha_run(confirm, count, long) {
            score += SCORE_HA_CONFIRM;
            reasons.push(
                if long {
                    "Consecutive bullish Heikin-Ashi candles"
                } else {
                    "Consecutive bearish Heikin-Ashi candles"
                }
                .to_string(),
            );
        }
    }

    // Rule 3: volume confirmation, first match wins.
    match config.volume_multiplier {
        Some(mult) => {
            if let Some(mean) = last.vol_mean30.filter(|m| *m > 0.0) {
                if last.bar.volume > mult * mean {
                    score += SCORE_VOLUME_HIGH;
                    reasons.push(format!(
                        "Volume {:.1}x above {}-bar average",
                        last.bar.volume / mean,
                        config.volume_avg_period
                    ));
                } else if let Some(z) = last.vol_z.filter(|z| *z > VOLUME_Z_FLOOR) {
                    score += SCORE_VOLUME_MED;
                    reasons.push(format!("Elevated volume (z-score {:.1})", z));
                }
            }
        }
        None => {
            // a disabled volume filter still contributes the medium tier;
            // behavior kept from the source strategy
            score += SCORE_VOLUME_MED;
            reasons.push("Volume check bypassed".to_string());
        }
    }

    // Rule 4: trend filter.
    if let Some(sma200) = last.sma200 {
        let aligned = if long {
            last.bar.close > sma200
        } else {
            last.bar.close < sma200
        };
        if aligned {
            score += SCORE_TREND_FILTER;
            reasons.push(
                if long {
                    "Close above 200-bar SMA"
                } else {
                    "Close below 200-bar SMA"
                }
                .to_string(),
            );
        }
    }

    (score, reasons)
}

/// Strictly monotonic RSI run over the last `span` steps of the window,
/// clamped to the steps actually available. Undefined RSI anywhere in the
/// run fails it.
fn rsi_run(window: &[EnrichedBar], span: usize, rising: bool) -> bool {
    let steps = span.min(window.len().saturating_sub(1));
    if steps == 0 {
        return false;
    }
    window[window.len() - steps - 1..]
        .windows(2)
        .all(|pair| match (pair[0].rsi14, pair[1].rsi14) {
            (Some(a), Some(b)) => {
                if rising {
                    b > a
                } else {
                    b < a
                }
            }
            _ => false,
        })
}

/// Last `count` candles all the required color, each HA close strictly
/// beyond the previous one. Clamped to the candles available.
fn ha_run(window: &[EnrichedBar], count: usize, green: bool) -> bool {
    let count = count.min(window.len());
    if count == 0 {
        return false;
    }
    let tail = &window[window.len() - count..];
    let color_ok = tail.iter().all(|e| e.ha.green == green);
    let trend_ok = tail.windows(2).all(|pair| {
        if green {
            pair[1].ha.close > pair[0].ha.close
        } else {
            pair[1].ha.close < pair[0].ha.close
        }
    });
    color_ok && trend_ok
}
