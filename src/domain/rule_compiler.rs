//! Compiles a wire-format [`StrategyDefinition`] into entry/exit predicates.
//!
//! Conditions within a rule are AND-ed; BUY rules are OR-ed into the entry
//! predicate and SELL rules into the exit predicate. All validation happens
//! here, before any bar is simulated.

use crate::domain::error::{BacktestError, ConditionLocation};
use crate::domain::execution::SignalSource;
use crate::domain::indicator::cache::IndicatorCache;
use crate::domain::ohlcv::BarSeries;
use crate::domain::rule::{Action, Condition};
use crate::domain::rule_eval::Predicate;
use crate::domain::strategy::{StrategyDefinition, StrategyRule};
use std::fmt;
use tracing::{debug, warn};

/// A validated rule: its action and the typed conditions it conjoins.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub index: usize,
    pub action: Action,
    pub conditions: Vec<Condition>,
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.action)?;
        if self.conditions.is_empty() {
            return write!(f, "always");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

/// Entry/exit predicates bound to the indicator values of one bar series.
#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    pub name: String,
    pub rules: Vec<CompiledRule>,
    entry: Predicate,
    exit: Predicate,
    indicators: IndicatorCache,
}

impl CompiledStrategy {
    pub fn should_enter(&self, index: usize) -> bool {
        self.entry.evaluate(&self.indicators, index)
    }

    pub fn should_exit(&self, index: usize) -> bool {
        self.exit.evaluate(&self.indicators, index)
    }

    pub fn indicators(&self) -> &IndicatorCache {
        &self.indicators
    }
}

impl SignalSource for CompiledStrategy {
    fn should_enter(&self, index: usize) -> bool {
        CompiledStrategy::should_enter(self, index)
    }

    fn should_exit(&self, index: usize) -> bool {
        CompiledStrategy::should_exit(self, index)
    }
}

/// Compile `definition` against `series`, computing every referenced
/// indicator once.
pub fn compile(
    definition: &StrategyDefinition,
    series: &BarSeries,
) -> Result<CompiledStrategy, BacktestError> {
    let rules = compile_rules(definition)?;

    let mut indicators = IndicatorCache::new();
    for rule in &rules {
        for condition in &rule.conditions {
            for spec in condition.indicators() {
                indicators.ensure(spec, series);
            }
        }
    }

    let mut entry = Vec::new();
    let mut exit = Vec::new();
    for rule in &rules {
        let predicate = Predicate::All(
            rule.conditions
                .iter()
                .copied()
                .map(Predicate::Compare)
                .collect(),
        );
        match rule.action {
            Action::Buy => entry.push(predicate),
            Action::Sell => exit.push(predicate),
        }
    }

    let entry = any_or_never(entry);
    let exit = any_or_never(exit);
    debug!(
        strategy = %definition.name,
        entry_conditions = entry.condition_count(),
        exit_conditions = exit.condition_count(),
        indicators = indicators.len(),
        "strategy compiled"
    );

    Ok(CompiledStrategy {
        name: definition.name.clone(),
        rules,
        entry,
        exit,
        indicators,
    })
}

fn any_or_never(rules: Vec<Predicate>) -> Predicate {
    if rules.is_empty() {
        Predicate::never()
    } else {
        Predicate::Any(rules)
    }
}

/// Run every compile-time check without bar data.
pub fn validate(definition: &StrategyDefinition) -> Result<Vec<CompiledRule>, BacktestError> {
    compile_rules(definition)
}

fn compile_rules(definition: &StrategyDefinition) -> Result<Vec<CompiledRule>, BacktestError> {
    let mut rules = Vec::with_capacity(definition.rules.len());
    for (index, rule) in definition.rules.iter().enumerate() {
        if let Some(compiled) = compile_rule(index, rule)? {
            rules.push(compiled);
        }
    }
    Ok(rules)
}

fn compile_rule(index: usize, rule: &StrategyRule) -> Result<Option<CompiledRule>, BacktestError> {
    let action: Action = rule
        .action
        .parse()
        .map_err(|e: crate::domain::error::RuleError| {
            e.at(ConditionLocation::rule(index, &rule.action))
        })?;

    let Some(raw_conditions) = &rule.conditions else {
        warn!(rule = index, action = %action, "rule has no condition list, skipping");
        return Ok(None);
    };

    let conditions = raw_conditions
        .iter()
        .enumerate()
        .map(|(ci, raw)| {
            Condition::parse(raw)
                .map_err(|e| e.at(ConditionLocation::condition(index, &rule.action, ci)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(CompiledRule {
        index,
        action,
        conditions,
    }))
}
