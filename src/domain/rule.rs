//! Typed rule model.
//!
//! - `Action`: which predicate a rule feeds (entry or exit)
//! - `Operator`: comparison applied between the two operands
//! - `Operand`: right-hand side, a literal or an indicator
//! - `Condition`: one validated `indicator <op> operand` comparison
//!
//! Names are matched case-insensitively, as the strategy store sends them.

use crate::domain::error::RuleError;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::strategy::{IndicatorParams, StrategyCondition};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
}

impl FromStr for Action {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            _ => Err(RuleError::UnsupportedAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    GreaterThan,
    LessThan,
    CrossesAbove,
    CrossesBelow,
}

impl Operator {
    pub fn is_cross(&self) -> bool {
        matches!(self, Operator::CrossesAbove | Operator::CrossesBelow)
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GREATER_THAN" => Ok(Operator::GreaterThan),
            "LESS_THAN" => Ok(Operator::LessThan),
            "CROSSES_ABOVE" => Ok(Operator::CrossesAbove),
            "CROSSES_BELOW" => Ok(Operator::CrossesBelow),
            _ => Err(RuleError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::GreaterThan => write!(f, "GREATER_THAN"),
            Operator::LessThan => write!(f, "LESS_THAN"),
            Operator::CrossesAbove => write!(f, "CROSSES_ABOVE"),
            Operator::CrossesBelow => write!(f, "CROSSES_BELOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Constant(Decimal),
    Indicator(IndicatorSpec),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Indicator(spec) => write!(f, "{}", spec),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition {
    pub left: IndicatorSpec,
    pub operator: Operator,
    pub right: Operand,
}

impl Condition {
    /// Validate one wire-format condition.
    pub fn parse(raw: &StrategyCondition) -> Result<Self, RuleError> {
        let left = parse_indicator(&raw.indicator_a.kind, &raw.indicator_a.params)?;
        let operator: Operator = raw.operator.parse()?;

        let right = match raw.indicator_b_type.trim().to_uppercase().as_str() {
            "VALUE" => Operand::Constant(parse_literal(raw.indicator_b_value.as_ref())?),
            "INDICATOR" => {
                let kind = match raw.indicator_b_value.as_ref() {
                    Some(Value::String(kind)) => kind.as_str(),
                    other => {
                        return Err(RuleError::UnsupportedIndicator(
                            other.map(Value::to_string).unwrap_or_default(),
                        ));
                    }
                };
                Operand::Indicator(parse_indicator(kind, &raw.indicator_b_params)?)
            }
            _ => return Err(RuleError::UnsupportedOperandType(raw.indicator_b_type.clone())),
        };

        if let (true, Operand::Constant(value)) = (operator.is_cross(), right) {
            return Err(RuleError::LiteralCrossOperand {
                operator: operator.to_string(),
                value,
            });
        }

        Ok(Condition {
            left,
            operator,
            right,
        })
    }

    /// Indicators this condition reads, left first.
    pub fn indicators(&self) -> Vec<IndicatorSpec> {
        match self.right {
            Operand::Indicator(spec) => vec![self.left, spec],
            Operand::Constant(_) => vec![self.left],
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.operator, self.right)
    }
}

pub fn parse_indicator(kind: &str, params: &IndicatorParams) -> Result<IndicatorSpec, RuleError> {
    let upper = kind.trim().to_uppercase();
    match upper.as_str() {
        "PRICE" => Ok(IndicatorSpec::Price),
        "SMA" => parse_period(&upper, params).map(IndicatorSpec::Sma),
        "EMA" => parse_period(&upper, params).map(IndicatorSpec::Ema),
        "RSI" => parse_period(&upper, params).map(IndicatorSpec::Rsi),
        _ => Err(RuleError::UnsupportedIndicator(kind.to_string())),
    }
}

/// Largest accepted indicator period.
const MAX_PERIOD: u64 = u32::MAX as u64;

fn parse_period(indicator: &str, params: &IndicatorParams) -> Result<usize, RuleError> {
    let invalid = |reason: String| RuleError::InvalidParameter {
        indicator: indicator.to_string(),
        reason,
    };

    let value = params
        .get("period")
        .ok_or_else(|| invalid("missing period".to_string()))?;

    let period = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= MAX_PERIOD as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    };

    match period {
        Some(p) if p > MAX_PERIOD => Err(invalid(format!(
            "period {} exceeds maximum {}",
            p, MAX_PERIOD
        ))),
        Some(p) if p > 0 => usize::try_from(p).map_err(|_| invalid(format!("period {} too large", p))),
        _ => Err(invalid(format!(
            "period must be a positive integer, got {}",
            value
        ))),
    }
}

fn parse_literal(value: Option<&Value>) -> Result<Decimal, RuleError> {
    let invalid = |reason: String| RuleError::InvalidParameter {
        indicator: "VALUE".to_string(),
        reason,
    };

    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(invalid(format!("expected a number, got {}", other))),
        None => return Err(invalid("missing literal value".to_string())),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid(format!("'{}' is not a decimal", text)))
}
