//! Per-backtest indicator cache.
//!
//! Keyed by [`IndicatorSpec`], so `SMA(20)` referenced by several conditions
//! is computed once. A cache belongs to exactly one compiled strategy and one
//! bar series; it is dropped with them.

use crate::domain::indicator::{IndicatorSeries, IndicatorSpec};
use crate::domain::ohlcv::BarSeries;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IndicatorCache {
    series: HashMap<IndicatorSpec, IndicatorSeries>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute `spec` over `bars` unless it is already cached.
    pub fn ensure(&mut self, spec: IndicatorSpec, bars: &BarSeries) -> &IndicatorSeries {
        self.series.entry(spec).or_insert_with(|| spec.compute(bars))
    }

    /// Value of `spec` at `index`; `None` if not cached, warming up or out of range.
    pub fn value(&self, spec: &IndicatorSpec, index: usize) -> Option<Decimal> {
        self.series.get(spec).and_then(|s| s.value(index))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Cached specs in display order.
    pub fn specs(&self) -> Vec<IndicatorSpec> {
        let mut specs: Vec<IndicatorSpec> = self.series.keys().copied().collect();
        specs.sort_by_key(|s| s.to_string());
        specs
    }
}
