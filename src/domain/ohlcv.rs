//! OHLCV bars and the immutable bar series the engine runs over.

use crate::domain::error::BacktestError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub end_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Ordered bars for one symbol. Timestamps are strictly increasing.
///
/// There is no mutation API: sorting and date filtering happen on the
/// `Vec<Bar>` before [`BarSeries::new`] is called.
#[derive(Debug, Clone)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BacktestError> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            if bar.close <= Decimal::ZERO {
                return Err(BacktestError::InvalidSeries {
                    symbol,
                    reason: format!("bar {} has non-positive close {}", i, bar.close),
                });
            }
            if i > 0 && bar.end_time <= bars[i - 1].end_time {
                return Err(BacktestError::InvalidSeries {
                    symbol,
                    reason: format!(
                        "bar {} at {} does not follow {}",
                        i,
                        bar.end_time,
                        bars[i - 1].end_time
                    ),
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn begin_index(&self) -> Option<usize> {
        if self.bars.is_empty() { None } else { Some(0) }
    }

    pub fn end_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    /// Every valid index, in ascending order.
    pub fn indices(&self) -> Range<usize> {
        0..self.bars.len()
    }

    pub fn bar(&self, index: usize) -> Result<&Bar, BacktestError> {
        self.bars.get(index).ok_or(BacktestError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    pub fn close(&self, index: usize) -> Result<Decimal, BacktestError> {
        self.bar(index).map(|b| b.close)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
