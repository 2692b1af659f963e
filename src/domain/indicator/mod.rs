//! Technical indicator implementations.
//!
//! - `IndicatorSpec`: indicator identity + typed parameters (serves as cache key)
//! - `IndicatorSeries`: one optional value per bar; `None` during warm-up
//! - [`cache::IndicatorCache`]: per-backtest memo of computed series

pub mod cache;
pub mod ema;
pub mod rsi;
pub mod sma;

use crate::domain::ohlcv::BarSeries;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorSpec {
    Price,
    Sma(usize),
    Ema(usize),
    Rsi(usize),
}

impl IndicatorSpec {
    pub fn compute(&self, series: &BarSeries) -> IndicatorSeries {
        let closes = series.closes();
        match *self {
            IndicatorSpec::Price => IndicatorSeries {
                spec: IndicatorSpec::Price,
                values: closes.into_iter().map(Some).collect(),
            },
            IndicatorSpec::Sma(period) => sma::calculate_sma(&closes, period),
            IndicatorSpec::Ema(period) => ema::calculate_ema(&closes, period),
            IndicatorSpec::Rsi(period) => rsi::calculate_rsi(&closes, period),
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSpec::Price => write!(f, "PRICE"),
            IndicatorSpec::Sma(period) => write!(f, "SMA({})", period),
            IndicatorSpec::Ema(period) => write!(f, "EMA({})", period),
            IndicatorSpec::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub spec: IndicatorSpec,
    pub values: Vec<Option<Decimal>>,
}

impl IndicatorSeries {
    pub fn undefined(spec: IndicatorSpec, len: usize) -> Self {
        Self {
            spec,
            values: vec![None; len],
        }
    }

    /// Value at `index`, `None` during warm-up or past the end.
    pub fn value(&self, index: usize) -> Option<Decimal> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
