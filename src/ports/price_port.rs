//! Current-price lookup port trait, consumed only by the monitoring sweep.

use crate::domain::error::DipscanError;

pub trait PricePort {
    /// Latest price for a ticker. `Ok(None)` means no quote is currently
    /// available; the sweep treats both that and `Err` as "skip and retry
    /// next sweep".
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, DipscanError>;
}
