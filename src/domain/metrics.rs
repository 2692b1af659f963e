//! Equity curve and report metrics.
//!
//! The equity curve tracks one unit of capital: flat between trades, scaled by
//! `close[i] / close[entry]` while a trade is held. Monetary and percentage
//! figures are derived from it and rounded half-up to two decimal places.

use crate::domain::ohlcv::BarSeries;
use crate::domain::trading_record::TradingRecord;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a trade still open at the last bar affects the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenPositionPolicy {
    /// Ignored entirely; the curve stays flat from its entry onward.
    #[default]
    Exclude,
    /// Valued at the last close. Still not a completed trade.
    MarkToMarket,
}

impl FromStr for OpenPositionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclude" => Ok(OpenPositionPolicy::Exclude),
            "mark_to_market" => Ok(OpenPositionPolicy::MarkToMarket),
            other => Err(format!(
                "unknown open position policy '{}', expected exclude or mark_to_market",
                other
            )),
        }
    }
}

impl fmt::Display for OpenPositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenPositionPolicy::Exclude => write!(f, "exclude"),
            OpenPositionPolicy::MarkToMarket => write!(f, "mark_to_market"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub strategy_name: String,
    pub symbol: String,
    pub total_trades: usize,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_profit_loss: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_return_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub win_rate_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_drawdown_percent: Decimal,
}

impl Report {
    /// All-zero report, used when there is nothing to simulate.
    pub fn empty(strategy_name: &str, symbol: &str) -> Self {
        Report {
            strategy_name: strategy_name.to_string(),
            symbol: symbol.to_string(),
            total_trades: 0,
            total_profit_loss: round2(Decimal::ZERO),
            total_return_percent: round2(Decimal::ZERO),
            win_rate_percent: round2(Decimal::ZERO),
            max_drawdown_percent: round2(Decimal::ZERO),
        }
    }

    pub fn compute(
        strategy_name: &str,
        symbol: &str,
        equity_curve: &[Decimal],
        record: &TradingRecord,
        initial_cash: Decimal,
    ) -> Self {
        if record.is_empty() || equity_curve.is_empty() || initial_cash <= Decimal::ZERO {
            return Report::empty(strategy_name, symbol);
        }

        let final_equity = equity_curve.last().copied().unwrap_or(Decimal::ONE);
        let pnl = final_equity * initial_cash - initial_cash;

        let total_trades = record.completed_count();
        let win_rate = if total_trades > 0 {
            Decimal::ONE_HUNDRED * Decimal::from(record.winning_count())
                / Decimal::from(total_trades)
        } else {
            Decimal::ZERO
        };

        Report {
            strategy_name: strategy_name.to_string(),
            symbol: symbol.to_string(),
            total_trades,
            total_profit_loss: round2(pnl),
            total_return_percent: round2(pnl / initial_cash * Decimal::ONE_HUNDRED),
            win_rate_percent: round2(win_rate),
            max_drawdown_percent: round2(compute_drawdown(equity_curve) * Decimal::ONE_HUNDRED),
        }
    }
}

/// Per-bar value of one unit of capital.
pub fn equity_curve(
    series: &BarSeries,
    record: &TradingRecord,
    policy: OpenPositionPolicy,
) -> Vec<Decimal> {
    let bars = series.bars();
    let Some(last_index) = series.end_index() else {
        return Vec::new();
    };

    let mut held = record
        .trades()
        .iter()
        .filter(|t| t.is_closed() || policy == OpenPositionPolicy::MarkToMarket)
        .peekable();

    let mut curve = Vec::with_capacity(bars.len());
    let mut equity = Decimal::ONE;
    // (equity before entry, entry price, last held index)
    let mut active: Option<(Decimal, Decimal, usize)> = None;

    for (index, bar) in bars.iter().enumerate() {
        if active.is_none() {
            if let Some(trade) = held.next_if(|t| t.entry_index == index) {
                active = Some((equity, trade.entry_price, *trade.span(last_index).end()));
            }
        }

        if let Some((base, entry_price, end)) = active {
            equity = base * bar.close / entry_price;
            if index >= end {
                active = None;
            }
        }
        curve.push(equity);
    }

    curve
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn compute_drawdown(equity_curve: &[Decimal]) -> Decimal {
    let Some(&first) = equity_curve.first() else {
        return Decimal::ZERO;
    };

    let mut peak = first;
    let mut max_dd = Decimal::ZERO;

    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        } else if peak > Decimal::ZERO {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Round half away from zero to two places, always carrying two decimals.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
