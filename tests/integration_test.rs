//! End-to-end tests over the public library API.
//!
//! Tests cover:
//! - Boundary behaviour (empty series, no rules, warm-up, constant prices)
//! - Price vs SMA(2) scenarios with known trades and metrics
//! - Open-position policies on the equity curve
//! - Position sizing
//! - `run_request` through mock strategy and data ports
//! - Compile errors surfacing before any simulation
//! - RSI, EMA and crossing strategies run end to end
//! - Property checks on RSI bounds, drawdown bounds and the position state machine

mod common;

use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stratsim::domain::backtest::{BacktestConfig, BacktestRequest, run_backtest, run_request};
use stratsim::domain::execution::simulate;
use stratsim::domain::indicator::IndicatorSpec;
use stratsim::domain::metrics::{OpenPositionPolicy, Report, compute_drawdown, round2};
use stratsim::domain::rule_compiler::compile;
use stratsim::domain::strategy::{IndicatorRef, StrategyCondition, StrategyRule};

fn cash(value: Decimal) -> BacktestConfig {
    BacktestConfig::new(value)
}

fn mark_to_market(value: Decimal) -> BacktestConfig {
    BacktestConfig {
        initial_cash: value,
        open_position: OpenPositionPolicy::MarkToMarket,
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn empty_series_yields_zero_report() {
        let result =
            run_backtest(&price_vs_sma(2), &BarSeries::empty("AAPL"), &cash(dec!(1000))).unwrap();
        assert_eq!(result.report, Report::empty("price-vs-sma", "AAPL"));
        assert_eq!(result.report.total_profit_loss.to_string(), "0.00");
        assert_eq!(result.report.max_drawdown_percent.to_string(), "0.00");
    }

    #[test]
    fn strategy_without_rules_never_trades() {
        let series = series_from_closes(&[dec!(10), dec!(20), dec!(5)]);
        let result = run_backtest(&strategy("idle", vec![]), &series, &cash(dec!(1000))).unwrap();
        assert!(result.record.is_empty());
        assert_eq!(result.report.total_trades, 0);
        assert_eq!(result.equity_curve, vec![Decimal::ONE; 3]);
    }

    #[test]
    fn rule_without_conditions_is_skipped() {
        let series = series_from_closes(&[dec!(10), dec!(20)]);
        let def = strategy(
            "skip",
            vec![StrategyRule {
                action: "BUY".into(),
                conditions: None,
            }],
        );
        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();
        assert!(result.record.is_empty());
    }

    #[test]
    fn warm_up_conditions_never_fire() {
        // SMA(3) is undefined for both bars
        let series = series_from_closes(&[dec!(100), dec!(200)]);
        let result = run_backtest(&price_vs_sma(3), &series, &cash(dec!(1000))).unwrap();
        assert!(result.record.is_empty());
    }

    #[test]
    fn constant_series_never_crosses_its_average() {
        let series = series_from_closes(&[dec!(50); 10]);
        let result = run_backtest(&price_vs_sma(3), &series, &cash(dec!(1000))).unwrap();
        assert!(result.record.is_empty());
        assert_eq!(result.report.total_return_percent, dec!(0.00));
    }

    #[test]
    fn cross_above_needs_a_previous_bar() {
        let def = strategy(
            "cross",
            vec![StrategyRule::new(
                "BUY",
                vec![StrategyCondition::against_indicator(
                    IndicatorRef::new("PRICE"),
                    "CROSSES_ABOVE",
                    IndicatorRef::with_period("SMA", 2),
                )],
            )],
        );
        // index 1: 90 < 95, index 2: 110 > 100
        let series = series_from_closes(&[dec!(100), dec!(90), dec!(110)]);
        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_index, 2);
        assert!(trades[0].is_open());
    }

    #[test]
    fn single_bar_can_enter_but_not_exit() {
        let series = series_from_closes(&[dec!(100)]);
        let result =
            run_backtest(&price_thresholds("0", "1000"), &series, &cash(dec!(1000))).unwrap();
        assert_eq!(result.record.trades().len(), 1);
        assert!(result.record.trades()[0].is_open());
        assert_eq!(result.report.total_trades, 0);
    }
}

mod price_vs_sma_scenarios {
    use super::*;

    #[test]
    fn round_trip_then_reentry_left_open() {
        let series = series_from_closes(&[dec!(100), dec!(102), dec!(99), dec!(101), dec!(105)]);
        let result = run_backtest(&price_vs_sma(2), &series, &cash(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].entry_index, trades[0].exit_index), (1, Some(2)));
        assert_eq!(trades[0].entry_price, dec!(102));
        assert_eq!(trades[0].exit_price, Some(dec!(99)));
        assert_eq!((trades[1].entry_index, trades[1].exit_index), (3, None));

        let report = &result.report;
        assert_eq!(report.total_trades, 1);
        assert_eq!(report.win_rate_percent, dec!(0.00));
        assert_eq!(report.total_profit_loss, dec!(-29.41));
        assert_eq!(report.total_return_percent, dec!(-2.94));
        assert_eq!(report.max_drawdown_percent, dec!(2.94));
    }

    #[test]
    fn open_trade_marked_to_market_moves_equity() {
        let series = series_from_closes(&[dec!(100), dec!(102), dec!(99), dec!(101), dec!(105)]);
        let result = run_backtest(&price_vs_sma(2), &series, &mark_to_market(dec!(1000))).unwrap();

        let expected = dec!(99) / dec!(102) * dec!(105) / dec!(101);
        assert_eq!(result.equity_curve.last().copied(), Some(expected));
        assert_eq!(result.report.total_trades, 1);
        assert_eq!(result.report.total_profit_loss, dec!(9.03));
    }

    #[test]
    fn late_entry_without_exit_reports_zero() {
        // only entry is at index 3 (101 > 99), nothing closes it
        let series = series_from_closes(&[dec!(100), dec!(98), dec!(97), dec!(101), dec!(105)]);
        let result = run_backtest(&price_vs_sma(2), &series, &cash(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_index, 3);
        assert!(trades[0].is_open());
        assert_eq!(result.report, Report::empty("price-vs-sma", "TEST"));
    }
}

mod metrics {
    use super::*;

    #[test]
    fn drawdown_from_open_position_curve() {
        let series = series_from_closes(&[dec!(100), dec!(120), dec!(90), dec!(110)]);
        let result =
            run_backtest(&price_thresholds("0", "0"), &series, &mark_to_market(dec!(1000)))
                .unwrap();

        assert_eq!(result.report.max_drawdown_percent, dec!(25.00));
        assert_eq!(result.report.total_profit_loss, dec!(100.00));
        assert_eq!(result.report.total_return_percent, dec!(10.00));
        assert_eq!(result.report.total_trades, 0);
    }

    #[test]
    fn same_curve_excluded_stays_flat() {
        let series = series_from_closes(&[dec!(100), dec!(120), dec!(90), dec!(110)]);
        let result =
            run_backtest(&price_thresholds("0", "0"), &series, &cash(dec!(1000))).unwrap();
        assert_eq!(result.equity_curve, vec![Decimal::ONE; 4]);
        assert_eq!(result.report.max_drawdown_percent, dec!(0.00));
    }

    #[test]
    fn one_win_one_loss_is_fifty_percent() {
        // enter 101, exit 104 (win); enter 110, exit 90 (loss)
        let series = series_from_closes(&[dec!(101), dec!(104), dec!(110), dec!(90)]);
        let result =
            run_backtest(&price_thresholds("100", "105"), &series, &cash(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 2);
        // exit at index 1 blocks re-entry on the same bar
        assert_eq!(trades[1].entry_index, 2);
        assert!(trades[0].is_profitable());
        assert!(!trades[1].is_profitable());

        let report = &result.report;
        assert_eq!(report.total_trades, 2);
        assert_eq!(report.win_rate_percent, dec!(50.00));
        let final_equity = dec!(104) / dec!(101) * dec!(90) / dec!(110);
        assert_eq!(
            report.total_profit_loss,
            round2(final_equity * dec!(1000) - dec!(1000))
        );
        assert_eq!(report.max_drawdown_percent, dec!(18.18));
    }

    #[test]
    fn report_serializes_two_decimal_strings() {
        let series = series_from_closes(&[dec!(100), dec!(120), dec!(90), dec!(110)]);
        let result =
            run_backtest(&price_thresholds("0", "0"), &series, &mark_to_market(dec!(1000)))
                .unwrap();
        let json = serde_json::to_value(&result.report).unwrap();
        assert_eq!(json["maxDrawdownPercent"], "25.00");
        assert_eq!(json["totalProfitLoss"], "100.00");
        assert_eq!(json["totalTrades"], 0);
    }
}

mod sizing {
    use super::*;

    #[test]
    fn cash_below_first_close_still_buys_one() {
        let series = series_from_closes(&[dec!(100), dec!(110)]);
        let result =
            run_backtest(&price_thresholds("0", "0"), &series, &cash(dec!(50))).unwrap();
        assert_eq!(result.record.quantity, dec!(1));
    }

    #[test]
    fn quantity_is_floored() {
        let series = series_from_closes(&[dec!(101), dec!(110)]);
        let result =
            run_backtest(&price_thresholds("0", "0"), &series, &cash(dec!(1000))).unwrap();
        assert_eq!(result.record.quantity, dec!(9));
    }

    #[test]
    fn non_positive_cash_is_rejected() {
        let series = series_from_closes(&[dec!(101)]);
        let err =
            run_backtest(&price_thresholds("0", "0"), &series, &cash(dec!(-5))).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidCash { .. }));
    }
}

mod request_pipeline {
    use super::*;

    fn request(strategy_id: &str, symbol: &str) -> BacktestRequest {
        BacktestRequest {
            strategy_id: strategy_id.to_string(),
            symbol: symbol.to_string(),
            start_date: date("2024-01-01"),
            end_date: date("2024-01-05"),
            initial_cash: dec!(1000),
        }
    }

    #[test]
    fn loads_fetches_and_runs() {
        let mut bars = bars_from_closes(&[dec!(100), dec!(102), dec!(99), dec!(101), dec!(105)]);
        // outside the requested window
        bars.push(make_bar("2024-02-01", dec!(500)));
        let data = MockDataPort::new().with_bars("AAPL", bars);
        let strategies = MockStrategyPort::new().with_strategy(price_vs_sma(2));

        let result = run_request(
            &request("price-vs-sma", "AAPL"),
            &strategies,
            &data,
            OpenPositionPolicy::Exclude,
        )
        .unwrap();

        assert_eq!(result.equity_curve.len(), 5);
        assert_eq!(result.report.symbol, "AAPL");
        assert_eq!(result.report.strategy_name, "price-vs-sma");
        assert_eq!(result.report.total_trades, 1);
    }

    #[test]
    fn unknown_strategy_is_load_error() {
        let data = MockDataPort::new();
        let strategies = MockStrategyPort::new();
        let err = run_request(
            &request("missing", "AAPL"),
            &strategies,
            &data,
            OpenPositionPolicy::Exclude,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::StrategyLoad { id, .. } if id == "missing"));
    }

    #[test]
    fn data_failure_propagates() {
        let data = MockDataPort::new().with_error("AAPL", "connection refused");
        let strategies = MockStrategyPort::new().with_strategy(price_vs_sma(2));
        let err = run_request(
            &request("price-vs-sma", "AAPL"),
            &strategies,
            &data,
            OpenPositionPolicy::Exclude,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::Data { reason } if reason == "connection refused"));
    }

    #[test]
    fn out_of_order_bars_are_rejected() {
        let bars = vec![
            make_bar("2024-01-02", dec!(10)),
            make_bar("2024-01-01", dec!(11)),
        ];
        let data = MockDataPort::new().with_bars("AAPL", bars);
        let strategies = MockStrategyPort::new().with_strategy(price_vs_sma(2));
        let err = run_request(
            &request("price-vs-sma", "AAPL"),
            &strategies,
            &data,
            OpenPositionPolicy::Exclude,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidSeries { .. }));
    }

    #[test]
    fn no_bars_in_window_is_empty_report() {
        let data = MockDataPort::new().with_bars("AAPL", vec![make_bar("2023-06-01", dec!(10))]);
        let strategies = MockStrategyPort::new().with_strategy(price_vs_sma(2));
        let result = run_request(
            &request("price-vs-sma", "AAPL"),
            &strategies,
            &data,
            OpenPositionPolicy::Exclude,
        )
        .unwrap();
        assert_eq!(result.report, Report::empty("price-vs-sma", "AAPL"));
    }
}

mod compile_errors {
    use super::*;

    fn single_condition(kind: IndicatorRef, op: &str, value: &str) -> stratsim::domain::strategy::StrategyDefinition {
        strategy(
            "bad",
            vec![StrategyRule::new(
                "BUY",
                vec![StrategyCondition::against_value(kind, op, value)],
            )],
        )
    }

    #[test]
    fn unsupported_indicator_names_location() {
        let def = single_condition(IndicatorRef::new("MACD"), "GREATER_THAN", "0");
        let err = run_backtest(&def, &series_from_closes(&[dec!(1)]), &cash(dec!(10))).unwrap_err();
        match err {
            BacktestError::UnsupportedFeature { location, reason } => {
                assert_eq!(location.rule, 0);
                assert_eq!(location.condition, Some(0));
                assert!(reason.contains("MACD"), "{}", reason);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_period_is_invalid_parameter() {
        let def = single_condition(IndicatorRef::with_period("SMA", 0), "GREATER_THAN", "0");
        let err = run_backtest(&def, &series_from_closes(&[dec!(1)]), &cash(dec!(10))).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidParameter { .. }));
    }

    #[test]
    fn oversized_period_is_invalid_parameter() {
        let def = single_condition(IndicatorRef::with_period("EMA", u64::MAX), "GREATER_THAN", "0");
        let err = run_backtest(&def, &series_from_closes(&[dec!(1)]), &cash(dec!(10))).unwrap_err();
        match err {
            BacktestError::InvalidParameter { location, reason } => {
                assert_eq!(location.rule, 0);
                assert!(reason.contains("EMA"), "{}", reason);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn literal_cross_operand_is_rejected() {
        let def = single_condition(IndicatorRef::new("PRICE"), "CROSSES_ABOVE", "10");
        let err = run_backtest(&def, &BarSeries::empty("X"), &cash(dec!(10))).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let def = single_condition(IndicatorRef::new("PRICE"), "EQUALS", "10");
        let err = run_backtest(&def, &series_from_closes(&[dec!(10)]), &cash(dec!(10))).unwrap_err();
        assert!(matches!(err, BacktestError::UnsupportedFeature { .. }));
    }
}

mod indicator_strategies {
    use super::*;

    fn rsi_rule(action: &str, op: &str, level: &str) -> StrategyRule {
        StrategyRule::new(
            action,
            vec![StrategyCondition::against_value(
                IndicatorRef::with_period("RSI", 2),
                op,
                level,
            )],
        )
    }

    fn price_vs(action: &str, op: &str, other: IndicatorRef) -> StrategyRule {
        StrategyRule::new(
            action,
            vec![StrategyCondition::against_indicator(IndicatorRef::new("PRICE"), op, other)],
        )
    }

    /// 1000, 999, then +10 per bar: 301 bars.
    fn long_rally() -> Vec<Decimal> {
        let mut closes = vec![dec!(1000), dec!(999)];
        closes.extend((1..300).map(|i| dec!(999) + Decimal::from(10 * i)));
        closes
    }

    #[test]
    fn rsi_oversold_buy_overbought_sell() {
        // RSI(2): index 2 -> 0, index 3 -> 0, index 4 -> 75
        let series = series_from_closes(&[
            dec!(100),
            dec!(98),
            dec!(96),
            dec!(94),
            dec!(100),
            dec!(106),
            dec!(112),
        ]);
        let def = strategy(
            "rsi-reversal",
            vec![
                rsi_rule("BUY", "LESS_THAN", "30"),
                rsi_rule("SELL", "GREATER_THAN", "70"),
            ],
        );
        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!((trades[0].entry_index, trades[0].exit_index), (2, Some(4)));
        assert_eq!(result.report.total_trades, 1);
        assert_eq!(result.report.win_rate_percent, dec!(100.00));
        assert_eq!(result.report.total_profit_loss, dec!(41.67));
        assert_eq!(result.report.max_drawdown_percent, dec!(2.08));
    }

    #[test]
    fn rsi_below_threshold_on_long_rally_never_fires() {
        let series = series_from_closes(&long_rally());
        let def = strategy("rsi-dip", vec![rsi_rule("BUY", "LESS_THAN", "30")]);
        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();
        assert!(result.record.is_empty());
        assert_eq!(result.equity_curve.len(), 301);
    }

    #[test]
    fn rsi_momentum_on_long_rally_holds_to_end() {
        let closes = long_rally();
        let series = series_from_closes(&closes);
        let def = strategy(
            "rsi-momentum",
            vec![
                rsi_rule("BUY", "GREATER_THAN", "70"),
                rsi_rule("SELL", "LESS_THAN", "30"),
            ],
        );
        let result = run_backtest(&def, &series, &mark_to_market(dec!(1000))).unwrap();

        let trades = result.record.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_index, 2);
        assert!(trades[0].is_open());
        let last = closes[300];
        assert_eq!(
            result.report.total_profit_loss,
            round2(last / dec!(1009) * dec!(1000) - dec!(1000))
        );
    }

    #[test]
    fn price_crossing_ema() {
        // EMA(3), k = 0.5: -, -, 10, 11.5, 11.75, 9.875, 9.4375
        let series = series_from_closes(&[
            dec!(10),
            dec!(10),
            dec!(10),
            dec!(13),
            dec!(12),
            dec!(8),
            dec!(9),
        ]);
        let ema = || IndicatorRef::with_period("EMA", 3);
        let def = strategy(
            "ema-cross",
            vec![
                price_vs("BUY", "CROSSES_ABOVE", ema()),
                price_vs("SELL", "CROSSES_BELOW", ema()),
            ],
        );

        let compiled = compile(&def, &series).unwrap();
        let values: Vec<_> = series
            .indices()
            .map(|i| compiled.indicators().value(&IndicatorSpec::Ema(3), i))
            .collect();
        assert_eq!(
            values,
            vec![
                None,
                None,
                Some(dec!(10)),
                Some(dec!(11.5)),
                Some(dec!(11.75)),
                Some(dec!(9.875)),
                Some(dec!(9.4375)),
            ]
        );

        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();
        let trades = result.record.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!((trades[0].entry_index, trades[0].exit_index), (3, Some(5)));
        assert_eq!(trades[0].entry_price, dec!(13));
        assert_eq!(trades[0].exit_price, Some(dec!(8)));
        assert_eq!(result.report.win_rate_percent, dec!(0.00));
        assert_eq!(result.report.total_profit_loss, dec!(-384.62));
        assert_eq!(result.report.max_drawdown_percent, dec!(38.46));
    }

    #[test]
    fn crosses_below_false_at_first_bar() {
        // SMA(2): -, 11, 10; price moves above then below it
        let series = series_from_closes(&[dec!(10), dec!(12), dec!(8)]);
        let def = strategy(
            "contrarian",
            vec![price_vs("BUY", "CROSSES_BELOW", IndicatorRef::with_period("SMA", 2))],
        );

        let compiled = compile(&def, &series).unwrap();
        let begin = series.begin_index().unwrap();
        assert!(!compiled.should_enter(begin));
        assert!(!compiled.should_enter(1));
        assert!(compiled.should_enter(2));

        let result = run_backtest(&def, &series, &cash(dec!(1000))).unwrap();
        assert_eq!(result.record.trades()[0].entry_index, 2);
    }

    #[test]
    fn crosses_below_against_price_itself_never_fires() {
        // PRICE and SMA(1) coincide from the first bar on
        let series = series_from_closes(&[dec!(10), dec!(9), dec!(8)]);
        let def = strategy(
            "degenerate",
            vec![price_vs("BUY", "CROSSES_BELOW", IndicatorRef::with_period("SMA", 1))],
        );
        let compiled = compile(&def, &series).unwrap();
        assert!(series.indices().all(|i| !compiled.should_enter(i)));
    }
}

mod properties {
    use super::*;

    fn closes_strategy() -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(1u32..10_000, 0..60)
            .prop_map(|cents| cents.into_iter().map(|c| Decimal::new(c as i64, 2)).collect())
    }

    proptest! {
        #[test]
        fn rsi_stays_within_bounds(closes in closes_strategy(), period in 1usize..20) {
            let series = series_from_closes(&closes);
            let rsi = IndicatorSpec::Rsi(period).compute(&series);
            prop_assert_eq!(rsi.len(), closes.len());
            for value in rsi.values.iter().flatten() {
                prop_assert!(*value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED);
            }
        }

        #[test]
        fn drawdown_is_a_fraction(closes in closes_strategy()) {
            let dd = compute_drawdown(&closes);
            prop_assert!(dd >= Decimal::ZERO && dd <= Decimal::ONE);
        }

        #[test]
        fn at_most_one_open_trade(closes in closes_strategy(), period in 1u64..6) {
            let series = series_from_closes(&closes);
            let compiled = compile(&price_vs_sma(period), &series).unwrap();
            let record = simulate(&series, &compiled, dec!(1000));

            let trades = record.trades();
            prop_assert!(trades.iter().filter(|t| t.is_open()).count() <= 1);
            for (i, trade) in trades.iter().enumerate() {
                if let Some(exit) = trade.exit_index {
                    prop_assert!(exit > trade.entry_index);
                } else {
                    prop_assert_eq!(i, trades.len() - 1);
                }
                if i > 0 {
                    prop_assert!(trade.entry_index > trades[i - 1].exit_index.unwrap_or(usize::MAX));
                }
            }
        }

        #[test]
        fn report_percentages_are_bounded(closes in closes_strategy()) {
            let series = series_from_closes(&closes);
            let result = run_backtest(&price_vs_sma(2), &series, &mark_to_market(dec!(1000))).unwrap();
            prop_assert!(result.report.win_rate_percent >= Decimal::ZERO);
            prop_assert!(result.report.win_rate_percent <= Decimal::ONE_HUNDRED);
            prop_assert!(result.report.max_drawdown_percent >= Decimal::ZERO);
            prop_assert!(result.report.max_drawdown_percent <= Decimal::ONE_HUNDRED);
            prop_assert_eq!(result.equity_curve.len(), closes.len());
        }
    }
}
