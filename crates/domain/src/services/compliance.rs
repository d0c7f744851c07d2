//! Compliance rule evaluation against reported device facts.
//!
//! A compliance rule's `rules` payload is a list of conditions:
//!
//! ```json
//! [{"field": "os.version", "operator": "gte", "value": 14},
//!  {"field": "security.firewallEnabled", "operator": "eq", "value": true}]
//! ```
//!
//! `field` is a dotted path into the facts document. Every condition must hold
//! for the rule to be compliant. A payload that cannot be evaluated yields
//! [`ComplianceStatus::Error`] for that rule only.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::policy_resolution::PolicyResolver;
use crate::error::StoreError;
use crate::models::{ComplianceRuleSettings, ComplianceStatus, DeviceComplianceReport, RuleEvaluation};

#[derive(Debug, Error, PartialEq)]
enum RuleError {
    #[error("rule conditions must be an array")]
    NotAnArray,

    #[error("condition {index} is missing '{key}'")]
    MissingKey { index: usize, key: &'static str },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{operator}' on '{field}' needs numeric operands")]
    NonNumeric { field: String, operator: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    Exists,
    NotExists,
}

impl Operator {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "contains" => Some(Self::Contains),
            "exists" => Some(Self::Exists),
            "not_exists" => Some(Self::NotExists),
            _ => None,
        }
    }
}

/// Look up a dotted path. Numeric segments index into arrays.
fn lookup<'a>(facts: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(facts, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
    .filter(|value| !value.is_null())
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Whether one condition holds. `Err` when the condition itself is malformed.
fn check_condition(index: usize, condition: &Value, facts: &Value) -> Result<Option<String>, RuleError> {
    let field = condition
        .get("field")
        .and_then(Value::as_str)
        .ok_or(RuleError::MissingKey { index, key: "field" })?;
    let operator_name = condition
        .get("operator")
        .and_then(Value::as_str)
        .ok_or(RuleError::MissingKey { index, key: "operator" })?;
    let operator = Operator::parse(operator_name)
        .ok_or_else(|| RuleError::UnknownOperator(operator_name.to_string()))?;
    let expected = condition.get("value").unwrap_or(&Value::Null);
    let actual = lookup(facts, field);

    let holds = match operator {
        Operator::Exists => actual.is_some(),
        Operator::NotExists => actual.is_none(),
        Operator::Eq => actual.is_some_and(|a| values_equal(a, expected)),
        Operator::Neq => !actual.is_some_and(|a| values_equal(a, expected)),
        Operator::Contains => match actual {
            Some(Value::String(s)) => expected.as_str().is_some_and(|needle| s.contains(needle)),
            Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, expected)),
            _ => false,
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let non_numeric = || RuleError::NonNumeric {
                field: field.to_string(),
                operator: operator_name.to_string(),
            };
            let bound = expected.as_f64().ok_or_else(non_numeric)?;
            match actual {
                None => false,
                Some(value) => {
                    let value = value.as_f64().ok_or_else(non_numeric)?;
                    match operator {
                        Operator::Gt => value > bound,
                        Operator::Gte => value >= bound,
                        Operator::Lt => value < bound,
                        _ => value <= bound,
                    }
                }
            }
        }
    };

    Ok((!holds).then(|| field.to_string()))
}

/// Evaluate one rule. Returns the first failing field, if any.
fn check_rule(rule: &ComplianceRuleSettings, facts: &Value) -> Result<Option<String>, RuleError> {
    let conditions = rule.rules.as_array().ok_or(RuleError::NotAnArray)?;
    for (index, condition) in conditions.iter().enumerate() {
        if let Some(field) = check_condition(index, condition, facts)? {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

pub fn evaluate_rule(rule: &ComplianceRuleSettings, facts: &Value) -> RuleEvaluation {
    let (status, failed_field, message) = match check_rule(rule, facts) {
        Ok(None) => (ComplianceStatus::Compliant, None, None),
        Ok(Some(field)) => (ComplianceStatus::NonCompliant, Some(field), None),
        Err(e) => {
            warn!(rule_id = %rule.id, error = %e, "Compliance rule could not be evaluated");
            (ComplianceStatus::Error, None, Some(e.to_string()))
        }
    };

    RuleEvaluation {
        rule_id: rule.id,
        rule_name: rule.name.clone(),
        status,
        failed_field,
        message,
    }
}

pub fn evaluate_rules(rules: &[ComplianceRuleSettings], facts: &Value) -> Vec<RuleEvaluation> {
    rules.iter().map(|rule| evaluate_rule(rule, facts)).collect()
}

/// Evaluates a device's winning compliance rules.
#[derive(Clone)]
pub struct ComplianceService {
    resolver: PolicyResolver,
}

impl ComplianceService {
    pub fn new(resolver: PolicyResolver) -> Self {
        Self { resolver }
    }

    /// Report for a device. An unknown device has no rules and is compliant.
    pub async fn evaluate_device(
        &self,
        device_id: Uuid,
        facts: &Value,
    ) -> Result<DeviceComplianceReport, StoreError> {
        let rules = self.resolver.resolve_compliance_rules(device_id).await?;
        Ok(DeviceComplianceReport::new(device_id, evaluate_rules(&rules, facts)))
    }
}
