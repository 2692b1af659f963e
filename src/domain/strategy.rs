//! Strategy definitions as received from the strategy store.
//!
//! This is the wire shape: indicator kinds, operators and actions are plain
//! strings and indicator parameters are untyped maps. Nothing here is trusted;
//! [`crate::domain::rule_compiler`] turns it into typed conditions once, at
//! compile time. Ownership is strictly top-down (strategy → rule → condition).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type IndicatorParams = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "userEmail")]
    pub owner_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<StrategyRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRule {
    pub action: String,
    /// `None` when the store sent no condition list; such a rule is skipped.
    #[serde(default)]
    pub conditions: Option<Vec<StrategyCondition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCondition {
    pub indicator_a: IndicatorRef,
    pub operator: String,
    pub indicator_b_type: String,
    /// A literal for `VALUE`, an indicator kind for `INDICATOR`.
    #[serde(default)]
    pub indicator_b_value: Option<Value>,
    #[serde(default)]
    pub indicator_b_params: IndicatorParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRef {
    pub kind: String,
    #[serde(default)]
    pub params: IndicatorParams,
}

impl IndicatorRef {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            params: IndicatorParams::new(),
        }
    }

    pub fn with_period(kind: &str, period: u64) -> Self {
        let mut params = IndicatorParams::new();
        params.insert("period".to_string(), Value::from(period));
        Self {
            kind: kind.to_string(),
            params,
        }
    }
}

impl StrategyRule {
    pub fn new(action: &str, conditions: Vec<StrategyCondition>) -> Self {
        Self {
            action: action.to_string(),
            conditions: Some(conditions),
        }
    }
}

impl StrategyCondition {
    /// `indicator_a <operator> <literal>`.
    pub fn against_value(indicator_a: IndicatorRef, operator: &str, value: &str) -> Self {
        Self {
            indicator_a,
            operator: operator.to_string(),
            indicator_b_type: "VALUE".to_string(),
            indicator_b_value: Some(Value::String(value.to_string())),
            indicator_b_params: IndicatorParams::new(),
        }
    }

    /// `indicator_a <operator> indicator_b`.
    pub fn against_indicator(
        indicator_a: IndicatorRef,
        operator: &str,
        indicator_b: IndicatorRef,
    ) -> Self {
        Self {
            indicator_a,
            operator: operator.to_string(),
            indicator_b_type: "INDICATOR".to_string(),
            indicator_b_value: Some(Value::String(indicator_b.kind)),
            indicator_b_params: indicator_b.params,
        }
    }
}
