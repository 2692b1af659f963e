//! Append-only record of the trades of one simulation run.

use crate::domain::position::{PositionState, Trade};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct TradingRecord {
    /// Units traded by every trade of the run.
    pub quantity: Decimal,
    trades: Vec<Trade>,
}

impl TradingRecord {
    pub fn new(quantity: Decimal) -> Self {
        TradingRecord {
            quantity,
            trades: Vec::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        match self.current_trade() {
            Some(_) => PositionState::Long,
            None => PositionState::Flat,
        }
    }

    /// Open a trade. Returns `false` and records nothing if one is already open.
    pub fn enter(&mut self, index: usize, price: Decimal) -> bool {
        if self.current_trade().is_some() {
            return false;
        }
        self.trades.push(Trade::open(index, price));
        true
    }

    /// Close the open trade. Returns `false` if flat or if `index` is not
    /// strictly after the entry.
    pub fn exit(&mut self, index: usize, price: Decimal) -> bool {
        match self.trades.last_mut() {
            Some(trade) if trade.is_open() && index > trade.entry_index => {
                trade.exit_index = Some(index);
                trade.exit_price = Some(price);
                true
            }
            _ => false,
        }
    }

    pub fn current_trade(&self) -> Option<&Trade> {
        self.trades.last().filter(|t| t.is_open())
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn completed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn completed_count(&self) -> usize {
        self.completed_trades().count()
    }

    pub fn winning_count(&self) -> usize {
        self.completed_trades().filter(|t| t.is_profitable()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
