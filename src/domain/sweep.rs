//! Periodic auto-exit monitoring sweep and manual sell.
//!
//! The sweep walks every OPEN position flagged for auto-exit, looks up its
//! current price and settles an exit when stop-loss or target is hit.
//! Failures are local: a price lookup or store error on one position is
//! logged and skipped, never fatal to the rest of the sweep.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::error::DipscanError;
use crate::domain::position::ExitReason;
use crate::ports::position_store::PositionStore;
use crate::ports::price_port::PricePort;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Positions whose price was looked up and evaluated.
    pub checked: usize,
    /// Exits settled this sweep.
    pub exited: usize,
    /// Positions skipped: price unavailable, lookup error, store error, or
    /// a lost settle race.
    pub skipped: usize,
}

pub fn run_sweep(
    store: &dyn PositionStore,
    prices: &dyn PricePort,
    now: DateTime<Utc>,
) -> Result<SweepReport, DipscanError> {
    let open = store.open_positions(true)?;
    info!(count = open.len(), "checking open positions for auto-exit");

    let mut report = SweepReport::default();

    for position in &open {
        let price = match prices.current_price(&position.ticker) {
            Ok(Some(price)) => price,
            Ok(None) => {
                warn!(ticker = %position.ticker, id = position.id, "no quote, skipping");
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(ticker = %position.ticker, id = position.id, %err, "price lookup failed, skipping");
                report.skipped += 1;
                continue;
            }
        };

        report.checked += 1;

        let Some(reason) = position.evaluate_exit(price) else {
            continue;
        };

        let fill = position.exit_fill(price, reason, now);
        match store.settle_exit(position.id, &fill) {
            Ok(true) => {
                info!(
                    ticker = %position.ticker,
                    id = position.id,
                    reason = %reason,
                    pnl = fill.pnl,
                    "auto-exit settled"
                );
                report.exited += 1;
            }
            Ok(false) => {
                // already closed elsewhere; the guard did its job
                warn!(ticker = %position.ticker, id = position.id, "exit raced, already closed");
                report.skipped += 1;
            }
            Err(err) => {
                warn!(ticker = %position.ticker, id = position.id, %err, "settle failed, will retry next sweep");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Manual sell: bypasses the stop/target checks, accepts any price. Only the
/// OPEN precondition applies; returns `false` when the position is already
/// closed (or loses the settle race).
pub fn manual_exit(
    store: &dyn PositionStore,
    id: i64,
    price: f64,
    now: DateTime<Utc>,
) -> Result<bool, DipscanError> {
    let position = store
        .get_position(id)?
        .ok_or(DipscanError::PositionNotFound { id })?;

    if !position.is_open() {
        return Ok(false);
    }

    let fill = position.exit_fill(price, ExitReason::Manual, now);
    let applied = store.settle_exit(id, &fill)?;
    if applied {
        info!(ticker = %position.ticker, id, pnl = fill.pnl, "manual exit settled");
    }
    Ok(applied)
}
