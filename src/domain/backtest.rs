//! Backtest orchestration.
//!
//! `run_backtest` is the pure core: one strategy over one bar series, all
//! state created and dropped inside the call. `run_request` adds the fetch
//! stage in front of it through the strategy and data ports.

use crate::domain::error::BacktestError;
use crate::domain::execution::simulate;
use crate::domain::metrics::{OpenPositionPolicy, Report, equity_curve};
use crate::domain::ohlcv::BarSeries;
use crate::domain::rule_compiler::compile;
use crate::domain::strategy::StrategyDefinition;
use crate::domain::trading_record::TradingRecord;
use crate::ports::data_port::DataPort;
use crate::ports::strategy_port::StrategyPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: Decimal,
    pub open_position: OpenPositionPolicy,
}

impl BacktestConfig {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            open_position: OpenPositionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: Decimal,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub report: Report,
    pub record: TradingRecord,
    pub equity_curve: Vec<Decimal>,
}

/// Compile `definition`, simulate it over `series` and compute the report.
///
/// Compile errors are returned before anything is simulated. An empty series
/// is not an error: it yields the all-zero report.
pub fn run_backtest(
    definition: &StrategyDefinition,
    series: &BarSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    if config.initial_cash <= Decimal::ZERO {
        return Err(BacktestError::InvalidCash {
            value: config.initial_cash,
        });
    }

    let strategy = compile(definition, series)?;

    if series.is_empty() {
        warn!(
            strategy = %definition.name,
            symbol = series.symbol(),
            "no bars to simulate, returning empty report"
        );
        return Ok(BacktestResult {
            report: Report::empty(&definition.name, series.symbol()),
            record: TradingRecord::new(Decimal::ZERO),
            equity_curve: Vec::new(),
        });
    }

    let record = simulate(series, &strategy, config.initial_cash);
    let curve = equity_curve(series, &record, config.open_position);
    let report = Report::compute(
        &definition.name,
        series.symbol(),
        &curve,
        &record,
        config.initial_cash,
    );

    info!(
        strategy = %report.strategy_name,
        symbol = %report.symbol,
        trades = report.total_trades,
        pnl = %report.total_profit_loss,
        "backtest complete"
    );

    Ok(BacktestResult {
        report,
        record,
        equity_curve: curve,
    })
}

/// Load the strategy, fetch the requested history and run the backtest.
pub fn run_request(
    request: &BacktestRequest,
    strategy_port: &dyn StrategyPort,
    data_port: &dyn DataPort,
    open_position: OpenPositionPolicy,
) -> Result<BacktestResult, BacktestError> {
    let definition = strategy_port.load_strategy(&request.strategy_id)?;
    info!(id = %request.strategy_id, name = %definition.name, "strategy loaded");

    let bars = data_port.fetch_bars(&request.symbol, request.start_date, request.end_date)?;
    info!(
        symbol = %request.symbol,
        bars = bars.len(),
        start = %request.start_date,
        end = %request.end_date,
        "bars fetched"
    );

    let series = BarSeries::new(&request.symbol, bars)?;
    let config = BacktestConfig {
        initial_cash: request.initial_cash,
        open_position,
    };
    run_backtest(&definition, &series, &config)
}
