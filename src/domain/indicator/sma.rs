//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = (C[i-n+1] + ... + C[i]) / n, kept as a rolling sum.
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorSpec};
use rust_decimal::Decimal;

pub fn calculate_sma(closes: &[Decimal], period: usize) -> IndicatorSeries {
    let spec = IndicatorSpec::Sma(period);
    if period == 0 {
        return IndicatorSeries::undefined(spec, closes.len());
    }

    let divisor = Decimal::from(period);
    let mut values = Vec::with_capacity(closes.len());
    let mut sum = Decimal::ZERO;

    for (i, &close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }

        if i + 1 < period {
            values.push(None);
        } else {
            values.push(Some(sum / divisor));
        }
    }

    IndicatorSeries { spec, values }
}
