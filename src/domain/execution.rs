//! FLAT/LONG simulation over a bar series.
//!
//! Fills happen at the bar's close. The traded quantity is fixed for the
//! whole run from the first close; there is no commission, slippage or cash
//! accounting beyond that.

use crate::domain::ohlcv::BarSeries;
use crate::domain::position::PositionState;
use crate::domain::trading_record::TradingRecord;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Entry/exit decisions per bar index.
pub trait SignalSource {
    fn should_enter(&self, index: usize) -> bool;
    fn should_exit(&self, index: usize) -> bool;
}

/// Whole units affordable at `price`, at least one.
pub fn position_quantity(initial_cash: Decimal, price: Decimal) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ONE;
    }
    (initial_cash / price).floor().max(Decimal::ONE)
}

/// Run the state machine over every index of `series`.
///
/// Steps per index, in ascending order:
/// 1. FLAT and `should_enter(i)`: open a trade at `close[i]`
/// 2. LONG and `should_exit(i)`: close the trade at `close[i]`
/// 3. Otherwise hold the current state
///
/// At most one transition happens per index, so a trade is never opened and
/// closed on the same bar. A position still open at the last bar is left open.
pub fn simulate<S: SignalSource + ?Sized>(
    series: &BarSeries,
    signals: &S,
    initial_cash: Decimal,
) -> TradingRecord {
    let bars = series.bars();
    let Some(first) = series.begin_index().map(|i| &bars[i]) else {
        return TradingRecord::new(Decimal::ZERO);
    };

    let quantity = position_quantity(initial_cash, first.close);
    info!(
        symbol = series.symbol(),
        %quantity,
        %initial_cash,
        first_price = %first.close,
        "position size fixed"
    );

    let mut record = TradingRecord::new(quantity);
    for index in series.indices() {
        let price = bars[index].close;
        match record.state() {
            PositionState::Flat => {
                if signals.should_enter(index) && record.enter(index, price) {
                    debug!(index, %price, "enter long");
                }
            }
            PositionState::Long => {
                if signals.should_exit(index) && record.exit(index, price) {
                    debug!(index, %price, "exit long");
                }
            }
        }
    }

    info!(
        symbol = series.symbol(),
        trades = record.trades().len(),
        completed = record.completed_count(),
        open = record.current_trade().is_some(),
        "simulation finished"
    );
    record
}
