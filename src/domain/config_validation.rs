//! Configuration validation.
//!
//! Checks the `[backtest]` section before any data is loaded. The typed
//! accessors are shared with the CLI so a value is parsed the same way it
//! was validated.

use crate::domain::error::BacktestError;
use crate::domain::metrics::OpenPositionPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;

const SECTION: &str = "backtest";

/// Check every `[backtest]` key and return the symbol to run, `symbol_override`
/// taking the place of `[backtest] symbol` when given.
pub fn validate_backtest_config(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<String, BacktestError> {
    validate_run_settings(config)?;
    symbol(config, symbol_override)
}

fn validate_run_settings(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    initial_cash(config)?;
    validate_dates(config)?;
    open_position(config)?;
    Ok(())
}

/// `[backtest] initial_cash`, which must be a positive decimal.
pub fn initial_cash(config: &dyn ConfigPort) -> Result<Decimal, BacktestError> {
    if config.get_string(SECTION, "initial_cash").is_none() {
        return Err(missing("initial_cash"));
    }
    match config.get_decimal(SECTION, "initial_cash") {
        Some(value) if value > Decimal::ZERO => Ok(value),
        Some(_) => Err(invalid("initial_cash", "initial_cash must be positive")),
        None => Err(invalid("initial_cash", "initial_cash must be a decimal number")),
    }
}

/// `[backtest] <key>` as a `YYYY-MM-DD` date.
pub fn date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, BacktestError> {
    let value = config.get_string(SECTION, key).ok_or_else(|| missing(key))?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| BacktestError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: format!("invalid {} format, expected YYYY-MM-DD", key),
    })
}

/// Non-empty symbol from `symbol_override`, else from `[backtest] symbol`.
pub fn symbol(config: &dyn ConfigPort, symbol_override: Option<&str>) -> Result<String, BacktestError> {
    if let Some(s) = symbol_override {
        return match s.trim() {
            "" => Err(invalid("symbol", "symbol override must not be empty")),
            trimmed => Ok(trimmed.to_string()),
        };
    }
    match config.get_string(SECTION, "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing("symbol")),
    }
}

/// `[backtest] open_position`, defaulting to `exclude`.
pub fn open_position(config: &dyn ConfigPort) -> Result<OpenPositionPolicy, BacktestError> {
    match config.get_string(SECTION, "open_position") {
        None => Ok(OpenPositionPolicy::default()),
        Some(s) => s.parse().map_err(|reason: String| invalid("open_position", &reason)),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start_date = date(config, "start_date")?;
    let end_date = date(config, "end_date")?;

    if start_date > end_date {
        return Err(invalid("start_date", "start_date must not be after end_date"));
    }
    Ok(())
}

fn missing(key: &str) -> BacktestError {
    BacktestError::ConfigMissing {
        section: SECTION.to_string(),
        key: key.to_string(),
    }
}

fn invalid(key: &str, reason: &str) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
