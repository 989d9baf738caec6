//! Position persistence port trait.

use crate::domain::error::DipscanError;
use crate::domain::position::{ExitFill, Position};

pub trait PositionStore {
    /// All OPEN positions, optionally only those flagged for auto-exit.
    fn open_positions(&self, auto_exit_only: bool) -> Result<Vec<Position>, DipscanError>;

    fn get_position(&self, id: i64) -> Result<Option<Position>, DipscanError>;

    /// Insert a freshly opened position; returns its assigned id.
    fn insert_position(&self, position: &Position) -> Result<i64, DipscanError>;

    /// Apply `fill` to position `id` in a single transaction, guarded on the
    /// position still being OPEN. Returns `false` when the guard fails — a
    /// concurrent sweep or manual sell won the race; the caller must treat
    /// that as a no-op, not an error.
    fn settle_exit(&self, id: i64, fill: &ExitFill) -> Result<bool, DipscanError>;
}
