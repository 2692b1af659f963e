//! Strategy store port trait.

use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyDefinition;

pub trait StrategyPort {
    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, BacktestError>;
}
