//! Trade and position state.

use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::Long => write!(f, "LONG"),
        }
    }
}

/// One long round trip. `exit_*` stay `None` while the trade is open.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub entry_price: Decimal,
    pub exit_index: Option<usize>,
    pub exit_price: Option<Decimal>,
}

impl Trade {
    pub fn open(entry_index: usize, entry_price: Decimal) -> Self {
        Self {
            entry_index,
            entry_price,
            exit_index: None,
            exit_price: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_index.is_some()
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    /// Closed with an exit price strictly above the entry price.
    pub fn is_profitable(&self) -> bool {
        matches!(self.exit_price, Some(exit) if exit > self.entry_price)
    }

    /// Bar indices the trade holds the position, through `last_index` if still open.
    pub fn span(&self, last_index: usize) -> std::ops::RangeInclusive<usize> {
        self.entry_index..=self.exit_index.unwrap_or(last_index)
    }
}
