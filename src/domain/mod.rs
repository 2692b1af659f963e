//! Core domain types and logic.
//!
//! Data flows leaf-first: [`ohlcv`] → [`indicator`] → [`rule_compiler`] →
//! [`execution`] → [`metrics`], orchestrated by [`backtest`].

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod rule;
pub mod rule_compiler;
pub mod rule_eval;
pub mod position;
pub mod trading_record;
pub mod execution;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
pub mod error;
