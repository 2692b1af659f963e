//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorSpec};
use rust_decimal::Decimal;

pub fn calculate_ema(closes: &[Decimal], period: usize) -> IndicatorSeries {
    let spec = IndicatorSpec::Ema(period);
    if period == 0 {
        return IndicatorSeries::undefined(spec, closes.len());
    }

    let mut values = Vec::with_capacity(closes.len());
    let k = Decimal::from(2) / (Decimal::from(period) + Decimal::ONE);
    let mut ema = Decimal::ZERO;
    let mut sum = Decimal::ZERO;

    for (i, &close) in closes.iter().enumerate() {
        if i < period - 1 {
            sum += close;
            values.push(None);
        } else if i == period - 1 {
            sum += close;
            ema = sum / Decimal::from(period);
            values.push(Some(ema));
        } else {
            ema += k * (close - ema);
            values.push(Some(ema));
        }
    }

    IndicatorSeries { spec, values }
}
