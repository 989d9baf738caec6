//! Scan driver: fetch → enrich → score → persist, per ticker.
//!
//! Progress is reported through an explicit [`ScanHandle`] with an
//! idle → running → completed/failed lifecycle, owned by whoever drives the
//! scan and cloned out to observers — no ambient global status.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::domain::indicator::enrich;
use crate::domain::scoring::{evaluate, StrategyConfig};
use crate::domain::signal::{Direction, Signal};
use crate::ports::data_port::DataPort;
use crate::ports::signal_store::SignalStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running { done: usize, total: usize },
    Completed(ScanReport),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Tickers whose history was evaluated.
    pub scanned: usize,
    /// Non-neutral signals recorded.
    pub signals: usize,
    /// Tickers skipped on fetch/persist failure or empty history.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct ScanHandle {
    state: Arc<Mutex<ScanState>>,
}

impl ScanHandle {
    pub fn new() -> Self {
        ScanHandle {
            state: Arc::new(Mutex::new(ScanState::Idle)),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, next: ScanState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
    }

    pub fn fail(&self, reason: &str) {
        self.set(ScanState::Failed(reason.to_string()));
    }
}

impl Default for ScanHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan every ticker: per-ticker failures are logged, counted and skipped,
/// never fatal. Every evaluation is persisted; non-neutral signals are also
/// returned for alerting.
pub fn run_scan(
    data: &dyn DataPort,
    signals: &dyn SignalStore,
    config: &StrategyConfig,
    tickers: &[String],
    handle: &ScanHandle,
    now: DateTime<Utc>,
) -> Vec<Signal> {
    let total = tickers.len();
    handle.set(ScanState::Running { done: 0, total });
    info!(total, "starting market scan");

    let mut report = ScanReport::default();
    let mut actionable = Vec::new();

    for (done, ticker) in tickers.iter().enumerate() {
        let bars = match data.fetch_bars(ticker) {
            Ok(bars) => bars,
            Err(err) => {
                warn!(%ticker, %err, "fetch failed, skipping");
                report.skipped += 1;
                handle.set(ScanState::Running {
                    done: done + 1,
                    total,
                });
                continue;
            }
        };

        if bars.is_empty() {
            debug!(%ticker, "no history, skipping");
            report.skipped += 1;
            handle.set(ScanState::Running {
                done: done + 1,
                total,
            });
            continue;
        }

        let series = enrich(&bars, config.volume_avg_period);
        let signal = evaluate(ticker, &series, config, now);

        debug!(
            %ticker,
            score = signal.score,
            direction = %signal.direction,
            "evaluated"
        );

        // a ticker lands in exactly one bucket: scanned or skipped
        match signals.record_signal(&signal) {
            Ok(_) => {
                report.scanned += 1;
                if signal.direction != Direction::Neutral {
                    report.signals += 1;
                    actionable.push(signal);
                }
            }
            Err(err) => {
                warn!(%ticker, %err, "failed to persist signal");
                report.skipped += 1;
            }
        }

        handle.set(ScanState::Running {
            done: done + 1,
            total,
        });
    }

    info!(
        scanned = report.scanned,
        signals = report.signals,
        skipped = report.skipped,
        "scan complete"
    );
    handle.set(ScanState::Completed(report));
    actionable
}
