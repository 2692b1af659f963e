//! Domain error types.

use rust_decimal::Decimal;
use std::fmt;

/// Where in a strategy definition a compile error was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionLocation {
    pub rule: usize,
    pub action: String,
    pub condition: Option<usize>,
}

impl ConditionLocation {
    pub fn rule(rule: usize, action: &str) -> Self {
        Self {
            rule,
            action: action.to_string(),
            condition: None,
        }
    }

    pub fn condition(rule: usize, action: &str, condition: usize) -> Self {
        Self {
            rule,
            action: action.to_string(),
            condition: Some(condition),
        }
    }
}

impl fmt::Display for ConditionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} ({})", self.rule, self.action)?;
        if let Some(condition) = self.condition {
            write!(f, " condition {}", condition)?;
        }
        Ok(())
    }
}

/// A problem with a single rule or condition, before it is tied to a location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("unsupported indicator '{0}'")]
    UnsupportedIndicator(String),

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),

    #[error("unsupported operand type '{0}'")]
    UnsupportedOperandType(String),

    #[error("{operator} requires an indicator operand, got literal {value}")]
    LiteralCrossOperand { operator: String, value: Decimal },

    #[error("{indicator}: {reason}")]
    InvalidParameter { indicator: String, reason: String },
}

impl RuleError {
    /// Attach the location of the offending rule/condition.
    pub fn at(self, location: ConditionLocation) -> BacktestError {
        let reason = self.to_string();
        match self {
            RuleError::InvalidParameter { .. } => {
                BacktestError::InvalidParameter { location, reason }
            }
            _ => BacktestError::UnsupportedFeature { location, reason },
        }
    }
}

/// Top-level error type for stratsim.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("unsupported feature at {location}: {reason}")]
    UnsupportedFeature {
        location: ConditionLocation,
        reason: String,
    },

    #[error("invalid parameter at {location}: {reason}")]
    InvalidParameter {
        location: ConditionLocation,
        reason: String,
    },

    #[error("invalid initial cash {value}: must be positive")]
    InvalidCash { value: Decimal },

    #[error("bar index {index} out of range for series of {len} bars")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid bar series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("failed to load strategy {id}: {reason}")]
    StrategyLoad { id: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    /// True for the errors raised while compiling a strategy definition.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BacktestError::UnsupportedFeature { .. } | BacktestError::InvalidParameter { .. }
        )
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. }
            | BacktestError::InvalidCash { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::UnsupportedFeature { .. }
            | BacktestError::InvalidParameter { .. }
            | BacktestError::StrategyLoad { .. }
            | BacktestError::Json(_) => 4,
            BacktestError::IndexOutOfRange { .. } | BacktestError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
