//! Signal persistence port trait.

use crate::domain::error::DipscanError;
use crate::domain::signal::Signal;

pub trait SignalStore {
    /// Append a signal to the log. Returns its assigned id.
    fn record_signal(&self, signal: &Signal) -> Result<i64, DipscanError>;
}
