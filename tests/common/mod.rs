#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
pub use stratsim::domain::error::BacktestError;
pub use stratsim::domain::ohlcv::{Bar, BarSeries};
use stratsim::domain::strategy::{IndicatorRef, StrategyCondition, StrategyDefinition, StrategyRule};
use stratsim::ports::data_port::DataPort;
use stratsim::ports::strategy_port::StrategyPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| {
                        let date = b.end_time.date_naive();
                        date >= start_date && date <= end_date
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).and_then(|bars| {
            let first = bars.first()?.end_time.date_naive();
            let last = bars.last()?.end_time.date_naive();
            Some((first, last, bars.len()))
        }))
    }
}

pub struct MockStrategyPort {
    pub strategies: HashMap<String, StrategyDefinition>,
}

impl MockStrategyPort {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn with_strategy(mut self, definition: StrategyDefinition) -> Self {
        self.strategies.insert(definition.id.clone(), definition);
        self
    }
}

impl StrategyPort for MockStrategyPort {
    fn load_strategy(&self, id: &str) -> Result<StrategyDefinition, BacktestError> {
        self.strategies
            .get(id)
            .cloned()
            .ok_or_else(|| BacktestError::StrategyLoad {
                id: id.to_string(),
                reason: "not found".to_string(),
            })
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: Decimal) -> Bar {
    Bar {
        end_time: date(date_str).and_hms_opt(0, 0, 0).unwrap().and_utc(),
        open: close,
        high: close,
        low: close,
        close,
        volume: dec!(1000),
    }
}

/// One bar per consecutive day starting 2024-01-01.
pub fn bars_from_closes(closes: &[Decimal]) -> Vec<Bar> {
    let start = date("2024-01-01");
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let day = start + chrono::Duration::days(i as i64);
            make_bar(&day.format("%Y-%m-%d").to_string(), close)
        })
        .collect()
}

pub fn series_from_closes(closes: &[Decimal]) -> BarSeries {
    BarSeries::new("TEST", bars_from_closes(closes)).unwrap()
}

pub fn strategy(id: &str, rules: Vec<StrategyRule>) -> StrategyDefinition {
    StrategyDefinition {
        id: id.to_string(),
        name: id.to_string(),
        owner_id: String::new(),
        description: String::new(),
        rules,
    }
}

/// BUY when PRICE is above SMA(period), SELL when below.
pub fn price_vs_sma(period: u64) -> StrategyDefinition {
    let cond = |op: &str| {
        StrategyCondition::against_indicator(
            IndicatorRef::new("PRICE"),
            op,
            IndicatorRef::with_period("SMA", period),
        )
    };
    strategy(
        "price-vs-sma",
        vec![
            StrategyRule::new("BUY", vec![cond("GREATER_THAN")]),
            StrategyRule::new("SELL", vec![cond("LESS_THAN")]),
        ],
    )
}

/// BUY when PRICE > `buy_above`, SELL when PRICE < `sell_below`.
pub fn price_thresholds(buy_above: &str, sell_below: &str) -> StrategyDefinition {
    strategy(
        "thresholds",
        vec![
            StrategyRule::new(
                "BUY",
                vec![StrategyCondition::against_value(
                    IndicatorRef::new("PRICE"),
                    "GREATER_THAN",
                    buy_above,
                )],
            ),
            StrategyRule::new(
                "SELL",
                vec![StrategyCondition::against_value(
                    IndicatorRef::new("PRICE"),
                    "LESS_THAN",
                    sell_below,
                )],
            ),
        ],
    )
}
