//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss)), evaluated as
//! 100 * avg_gain / (avg_gain + avg_loss) so a vanishing avg_loss cannot overflow.
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes to seed).

use crate::domain::indicator::{IndicatorSeries, IndicatorSpec};
use rust_decimal::Decimal;

pub fn calculate_rsi(closes: &[Decimal], period: usize) -> IndicatorSeries {
    let spec = IndicatorSpec::Rsi(period);
    if period == 0 || closes.len() <= period {
        return IndicatorSeries::undefined(spec, closes.len());
    }

    let n = Decimal::from(period);
    let n_minus_1 = Decimal::from(period - 1);
    let mut values = Vec::with_capacity(closes.len());
    values.push(None);

    let mut avg_gain = Decimal::ZERO;
    let mut avg_loss = Decimal::ZERO;

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            values.push(None);
            continue;
        }

        if i == period {
            avg_gain = (avg_gain + gain) / n;
            avg_loss = (avg_loss + loss) / n;
        } else {
            avg_gain = (avg_gain * n_minus_1 + gain) / n;
            avg_loss = (avg_loss * n_minus_1 + loss) / n;
        }
        values.push(Some(rsi_value(avg_gain, avg_loss)));
    }

    IndicatorSeries { spec, values }
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::ONE_HUNDRED;
    }
    Decimal::ONE_HUNDRED * avg_gain / (avg_gain + avg_loss)
}
