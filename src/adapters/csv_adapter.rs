//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row and columns
//! `end_time,open,high,low,close,volume`. `end_time` is either a plain
//! `YYYY-MM-DD` date (taken as midnight UTC) or an RFC 3339 timestamp.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, BacktestError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| BacktestError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            // header is line 1
            let row = line + 2;

            let end_time = parse_end_time(column(&record, 0, "end_time", row)?).ok_or_else(|| {
                BacktestError::Data {
                    reason: format!("row {}: invalid end_time", row),
                }
            })?;

            bars.push(Bar {
                end_time,
                open: decimal_column(&record, 1, "open", row)?,
                high: decimal_column(&record, 2, "high", row)?,
                low: decimal_column(&record, 3, "low", row)?,
                close: decimal_column(&record, 4, "close", row)?,
                volume: decimal_column(&record, 5, "volume", row)?,
            });
        }

        bars.sort_by_key(|b| b.end_time);
        Ok(bars)
    }
}

fn column<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, BacktestError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| BacktestError::Data {
            reason: format!("row {}: missing {} column", row, name),
        })
}

fn decimal_column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<Decimal, BacktestError> {
    let raw = column(record, index, name, row)?;
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| BacktestError::Data {
            reason: format!("row {}: invalid {} value '{}': {}", row, name, raw, e),
        })
}

fn parse_end_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, BacktestError> {
        let bars = self
            .read_all(symbol)?
            .into_iter()
            .filter(|b| {
                let date = b.end_time.date_naive();
                date >= start_date && date <= end_date
            })
            .collect();
        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((
                first.end_time.date_naive(),
                last.end_time.date_naive(),
                bars.len(),
            )),
            _ => None,
        })
    }
}
