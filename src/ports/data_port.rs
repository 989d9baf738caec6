//! Bar history access port trait.

use crate::domain::error::DipscanError;
use crate::domain::ohlcv::Bar;

pub trait DataPort {
    /// Full ordered daily history for a ticker, oldest first.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<Bar>, DipscanError>;

    /// Every ticker the adapter has data for.
    fn list_tickers(&self) -> Result<Vec<String>, DipscanError>;
}
