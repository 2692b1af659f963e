//! Predicate evaluation against cached indicator values.
//!
//! # Evaluation Semantics
//!
//! - Comparisons are strict and read both operands at the given bar index
//! - `CROSSES_ABOVE`/`CROSSES_BELOW` also read `index - 1`; `false` at index 0
//! - Any undefined operand (warm-up, out of range) makes the comparison `false`
//! - `All`: short-circuits on first `false`, empty is `true`
//! - `Any`: short-circuits on first `true`, empty is `false`

use crate::domain::indicator::IndicatorSpec;
use crate::domain::indicator::cache::IndicatorCache;
use crate::domain::rule::{Condition, Operand, Operator};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Condition),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// A predicate that never fires.
    pub fn never() -> Self {
        Predicate::Any(Vec::new())
    }

    pub fn evaluate(&self, indicators: &IndicatorCache, index: usize) -> bool {
        match self {
            Predicate::Compare(condition) => evaluate_condition(condition, indicators, index),
            Predicate::All(children) => children.iter().all(|p| p.evaluate(indicators, index)),
            Predicate::Any(children) => children.iter().any(|p| p.evaluate(indicators, index)),
        }
    }

    /// Number of leaf comparisons.
    pub fn condition_count(&self) -> usize {
        match self {
            Predicate::Compare(_) => 1,
            Predicate::All(children) | Predicate::Any(children) => {
                children.iter().map(Predicate::condition_count).sum()
            }
        }
    }
}

pub fn evaluate_condition(condition: &Condition, indicators: &IndicatorCache, index: usize) -> bool {
    let current = operands(condition, indicators, index);

    match condition.operator {
        Operator::GreaterThan => matches!(current, Some((l, r)) if l > r),
        Operator::LessThan => matches!(current, Some((l, r)) if l < r),
        Operator::CrossesAbove | Operator::CrossesBelow => {
            if index == 0 {
                return false;
            }
            let (Some((left_curr, right_curr)), Some((left_prev, right_prev))) =
                (current, operands(condition, indicators, index - 1))
            else {
                return false;
            };
            if condition.operator == Operator::CrossesAbove {
                left_prev <= right_prev && left_curr > right_curr
            } else {
                left_prev >= right_prev && left_curr < right_curr
            }
        }
    }
}

fn operands(
    condition: &Condition,
    indicators: &IndicatorCache,
    index: usize,
) -> Option<(Decimal, Decimal)> {
    let left = resolve_indicator(&condition.left, indicators, index)?;
    let right = match &condition.right {
        Operand::Constant(v) => *v,
        Operand::Indicator(spec) => resolve_indicator(spec, indicators, index)?,
    };
    Some((left, right))
}

fn resolve_indicator(spec: &IndicatorSpec, indicators: &IndicatorCache, index: usize) -> Option<Decimal> {
    indicators.value(spec, index)
}
