//! Report output port trait.

use crate::domain::error::BacktestError;
use crate::domain::metrics::Report;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, report: &Report, output_path: &str) -> Result<(), BacktestError>;
}
