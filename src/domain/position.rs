//! Paper position lifecycle: one irreversible OPEN → CLOSED transition.
//!
//! Entry happens in the order-placement flow outside the core; this module
//! owns the exit decision (stop-loss before target) and the fill arithmetic.
//! The actual mutation is applied by a [`crate::ports::position_store`]
//! implementation inside a status-guarded transaction.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::error::DipscanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Open,
    Closed,
    Expired,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
            PositionStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DipscanError> {
        match s {
            "OPEN" => Ok(PositionStatus::Open),
            "CLOSED" => Ok(PositionStatus::Closed),
            "EXPIRED" => Ok(PositionStatus::Expired),
            other => Err(DipscanError::Database {
                reason: format!("unknown position status: {other}"),
            }),
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Manual,
    Target,
    StopLoss,
    Auto,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Manual => "MANUAL",
            ExitReason::Target => "TARGET",
            ExitReason::StopLoss => "STOPLOSS",
            ExitReason::Auto => "AUTO",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DipscanError> {
        match s {
            "MANUAL" => Ok(ExitReason::Manual),
            "TARGET" => Ok(ExitReason::Target),
            "STOPLOSS" => Ok(ExitReason::StopLoss),
            "AUTO" => Ok(ExitReason::Auto),
            other => Err(DipscanError::Database {
                reason: format!("unknown exit reason: {other}"),
            }),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub id: i64,
    pub ticker: String,
    pub signal_id: Option<i64>,
    pub entry_price: f64,
    pub quantity: i64,
    pub stop_loss: Option<f64>,
    pub target_price: Option<f64>,
    pub auto_exit: bool,
    pub status: PositionStatus,
    pub entry_time: DateTime<Utc>,
    pub exit_price: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
}

/// The values an exit writes, computed once and applied atomically by the
/// store. Keeping them together means no partial pnl write can ever be
/// observed without the status flip.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitFill {
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub pnl: f64,
    pub pnl_percent: f64,
}

impl Position {
    /// New open position satisfying the entry invariants: no exit fields set.
    /// `id` is assigned by the store on insert.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        ticker: &str,
        signal_id: Option<i64>,
        entry_price: f64,
        quantity: i64,
        stop_loss: Option<f64>,
        target_price: Option<f64>,
        auto_exit: bool,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Position {
            id: 0,
            ticker: ticker.to_string(),
            signal_id,
            entry_price,
            quantity,
            stop_loss,
            target_price,
            auto_exit,
            status: PositionStatus::Open,
            entry_time,
            exit_price: None,
            exit_time: None,
            exit_reason: None,
            pnl: None,
            pnl_percent: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Auto-exit trigger check. Stop-loss is evaluated first: when a
    /// misconfiguration (stop >= target) lets a price satisfy both, the
    /// stop wins.
    pub fn evaluate_exit(&self, price: f64) -> Option<ExitReason> {
        if let Some(stop) = self.stop_loss {
            if price <= stop {
                return Some(ExitReason::StopLoss);
            }
        }
        if let Some(target) = self.target_price {
            if price >= target {
                return Some(ExitReason::Target);
            }
        }
        None
    }

    /// pnl = (exit - entry) * quantity; pnl% = (exit - entry) / entry * 100.
    pub fn exit_fill(&self, price: f64, reason: ExitReason, time: DateTime<Utc>) -> ExitFill {
        let pnl = (price - self.entry_price) * self.quantity as f64;
        let pnl_percent = (price - self.entry_price) / self.entry_price * 100.0;
        ExitFill {
            exit_price: price,
            exit_time: time,
            exit_reason: reason,
            pnl,
            pnl_percent,
        }
    }

    /// Apply a fill to an in-memory copy. Store implementations mirror this
    /// in their transactional update.
    pub fn apply_fill(&mut self, fill: &ExitFill) {
        self.exit_price = Some(fill.exit_price);
        self.exit_time = Some(fill.exit_time);
        self.exit_reason = Some(fill.exit_reason);
        self.pnl = Some(fill.pnl);
        self.pnl_percent = Some(fill.pnl_percent);
        self.status = PositionStatus::Closed;
    }
}
