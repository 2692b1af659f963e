//! Historical bar data port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` with `end_time` between the two dates inclusive,
    /// ascending by time.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, BacktestError>;

    /// First date, last date and bar count, or `None` if there is no data.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError>;
}
