//! Writes the report as pretty-printed JSON.

use crate::domain::error::BacktestError;
use crate::domain::metrics::Report;
use crate::ports::report_port::ReportPort;
use std::fs;

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &Report, output_path: &str) -> Result<(), BacktestError> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(output_path, json + "\n")?;
        Ok(())
    }
}
