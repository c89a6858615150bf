//! Rule Engine: Type Definitions
//!
//! JSON policy rule format. Rules carry a kind (`rule_type`) and a
//! kind-specific condition payload; on load the pair becomes one typed
//! `RuleCondition` variant. Unknown kinds load as an inert `Unsupported`
//! variant and unknown operators deserialize to `Unsupported` operators, so a
//! newer catalog never fails to load on an older engine.

use crate::models::verdict::RiskLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// Action a violated rule requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Reject,
    FlagForReview,
    FlagAsSuspicious,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Reject => "reject",
            RuleAction::FlagForReview => "flag_for_review",
            RuleAction::FlagAsSuspicious => "flag_as_suspicious",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative fraud rule
///
/// Immutable once loaded; evaluation never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicyRule", into = "RawPolicyRule")]
pub struct PolicyRule {
    pub policy_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub condition: RuleCondition,
    pub action: RuleAction,
    pub severity: RiskLevel,
    pub is_active: bool,
}

impl PolicyRule {
    /// Kind name as it appears in JSON (`rule_type`)
    pub fn rule_type(&self) -> &str {
        self.condition.rule_type()
    }
}

/// Wire form of a rule: kind name plus untyped conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPolicyRule {
    pub policy_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub rule_type: String,
    #[serde(default)]
    pub conditions: JsonValue,
    pub action: RuleAction,
    pub severity: RiskLevel,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Conditions payload did not fit its declared kind
#[derive(Debug, Error, PartialEq)]
#[error("policy {policy_id}: invalid {rule_type} conditions: {reason}")]
pub struct ConditionError {
    pub policy_id: String,
    pub rule_type: String,
    pub reason: String,
}

impl TryFrom<RawPolicyRule> for PolicyRule {
    type Error = ConditionError;

    fn try_from(raw: RawPolicyRule) -> Result<Self, Self::Error> {
        let condition = RuleCondition::from_parts(&raw.rule_type, raw.conditions).map_err(
            |reason| ConditionError {
                policy_id: raw.policy_id.clone(),
                rule_type: raw.rule_type.clone(),
                reason,
            },
        )?;

        Ok(PolicyRule {
            policy_id: raw.policy_id,
            name: raw.name,
            description: raw.description,
            category: raw.category,
            condition,
            action: raw.action,
            severity: raw.severity,
            is_active: raw.is_active,
        })
    }
}

impl From<PolicyRule> for RawPolicyRule {
    fn from(rule: PolicyRule) -> Self {
        let rule_type = rule.condition.rule_type().to_string();
        RawPolicyRule {
            policy_id: rule.policy_id,
            name: rule.name,
            description: rule.description,
            category: rule.category,
            rule_type,
            conditions: rule.condition.to_json(),
            action: rule.action,
            severity: rule.severity,
            is_active: rule.is_active,
        }
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Typed condition, one variant per rule kind
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    Boolean(BooleanCondition),
    Threshold(ThresholdCondition),
    Pattern(PatternCondition),
    Compound(CompoundCondition),
    ListCheck(ListCheckCondition),
    Comparison(ComparisonCondition),
    Velocity(VelocityCondition),
    Validation(ValidationCondition),

    /// Unrecognized kind; never fires
    Unsupported {
        rule_type: String,
        conditions: JsonValue,
    },
}

impl RuleCondition {
    /// Build a typed condition from a kind name and its JSON payload
    pub fn from_parts(rule_type: &str, conditions: JsonValue) -> Result<Self, String> {
        fn parse<T: serde::de::DeserializeOwned>(v: JsonValue) -> Result<T, String> {
            serde_json::from_value(v).map_err(|e| e.to_string())
        }

        Ok(match rule_type {
            "boolean" => RuleCondition::Boolean(parse(conditions)?),
            "threshold" => RuleCondition::Threshold(parse(conditions)?),
            "pattern" => RuleCondition::Pattern(parse(conditions)?),
            "compound" => RuleCondition::Compound(parse(conditions)?),
            "list_check" => RuleCondition::ListCheck(parse(conditions)?),
            "comparison" => RuleCondition::Comparison(parse(conditions)?),
            "velocity" => RuleCondition::Velocity(parse(conditions)?),
            "validation" => RuleCondition::Validation(parse(conditions)?),
            other => RuleCondition::Unsupported {
                rule_type: other.to_string(),
                conditions,
            },
        })
    }

    pub fn rule_type(&self) -> &str {
        match self {
            RuleCondition::Boolean(_) => "boolean",
            RuleCondition::Threshold(_) => "threshold",
            RuleCondition::Pattern(_) => "pattern",
            RuleCondition::Compound(_) => "compound",
            RuleCondition::ListCheck(_) => "list_check",
            RuleCondition::Comparison(_) => "comparison",
            RuleCondition::Velocity(_) => "velocity",
            RuleCondition::Validation(_) => "validation",
            RuleCondition::Unsupported { rule_type, .. } => rule_type,
        }
    }

    /// JSON payload for this condition
    pub fn to_json(&self) -> JsonValue {
        let encoded = match self {
            RuleCondition::Boolean(c) => serde_json::to_value(c),
            RuleCondition::Threshold(c) => serde_json::to_value(c),
            RuleCondition::Pattern(c) => serde_json::to_value(c),
            RuleCondition::Compound(c) => serde_json::to_value(c),
            RuleCondition::ListCheck(c) => serde_json::to_value(c),
            RuleCondition::Comparison(c) => serde_json::to_value(c),
            RuleCondition::Velocity(c) => serde_json::to_value(c),
            RuleCondition::Validation(c) => serde_json::to_value(c),
            RuleCondition::Unsupported { conditions, .. } => Ok(conditions.clone()),
        };
        encoded.unwrap_or(JsonValue::Null)
    }
}

/// Named field equals an expected literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanCondition {
    pub field: String,
    pub value: JsonValue,
}

/// Threshold operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdOperator {
    LessThan,
    GreaterThan,
    ExceedsAverageByPercent,
    #[serde(other)]
    Unsupported,
}

/// Numeric field compared with a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCondition {
    pub field: String,
    pub operator: ThresholdOperator,
    pub threshold: f64,
}

/// Regex search on a field's string value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCondition {
    pub field: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

/// Operators usable inside a compound condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicOperator {
    LessThan,
    GreaterThan,
    Equals,
    IsRoundNumber,
    #[serde(other)]
    Unsupported,
}

impl AtomicOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomicOperator::LessThan => "less_than",
            AtomicOperator::GreaterThan => "greater_than",
            AtomicOperator::Equals => "equals",
            AtomicOperator::IsRoundNumber => "is_round_number",
            AtomicOperator::Unsupported => "unsupported",
        }
    }
}

/// One nested condition of a compound rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicCondition {
    pub field: String,
    pub operator: AtomicOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(default = "default_precision")]
    pub precision: f64,
}

fn default_precision() -> f64 {
    100.0
}

/// AND (`all`) / OR (`any`) of atomic conditions
///
/// A non-empty `all` list takes precedence; an empty `all` falls through to
/// `any`; both empty never fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompoundCondition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<AtomicCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<AtomicCondition>,
}

/// Membership operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOperator {
    In,
    NotIn,
    #[serde(other)]
    Unsupported,
}

/// Field value membership in a reference list resolved from the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCheckCondition {
    pub field: String,
    pub operator: MembershipOperator,
    pub reference: String,
}

/// Equality operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    #[serde(other)]
    Unsupported,
}

/// Field compared with a reference field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub reference: String,
}

/// Event count within a time window (evaluated against live history)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityCondition {
    #[serde(default)]
    pub event: String,
    pub time_window_hours: i64,
    pub max_count: usize,
}

/// Cross-field consistency check (reserved)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationCondition {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub operator: String,
}

// ============================================================================
// VIOLATIONS
// ============================================================================

/// A rule that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub policy_id: String,
    pub policy_name: String,
    pub description: String,
    pub category: String,
    pub severity: RiskLevel,
    pub action: RuleAction,
    pub details: String,
}

impl Violation {
    pub fn from_rule(rule: &PolicyRule, details: impl Into<String>) -> Self {
        Self {
            policy_id: rule.policy_id.clone(),
            policy_name: rule.name.clone(),
            description: rule.description.clone(),
            category: rule.category.clone(),
            severity: rule.severity,
            action: rule.action,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_loads_as_unsupported() {
        let json = r#"{
            "policy_id": "X1",
            "name": "Future rule",
            "rule_type": "geo_fence",
            "conditions": {"radius_km": 5},
            "action": "flag_for_review",
            "severity": "low"
        }"#;
        let rule: PolicyRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.rule_type(), "geo_fence");
        assert!(rule.is_active);
        assert!(matches!(rule.condition, RuleCondition::Unsupported { .. }));
    }

    #[test]
    fn test_unknown_operator_deserializes() {
        let json = r#"{"field": "amount", "operator": "between", "threshold": 5}"#;
        let cond: ThresholdCondition = serde_json::from_str(json).unwrap();
        assert_eq!(cond.operator, ThresholdOperator::Unsupported);
    }

    #[test]
    fn test_round_number_precision_defaults() {
        let json = r#"{"field": "amount", "operator": "is_round_number"}"#;
        let cond: AtomicCondition = serde_json::from_str(json).unwrap();
        assert_eq!(cond.precision, 100.0);
    }

    #[test]
    fn test_malformed_conditions_rejected() {
        let json = r#"{
            "policy_id": "BAD",
            "name": "Broken",
            "rule_type": "threshold",
            "conditions": {"field": "amount"},
            "action": "reject",
            "severity": "high"
        }"#;
        let err = serde_json::from_str::<PolicyRule>(json).unwrap_err();
        assert!(err.to_string().contains("BAD"));
    }

    #[test]
    fn test_rule_round_trips_wire_form() {
        let json = r#"{
            "policy_id": "P1",
            "name": "Cash",
            "rule_type": "pattern",
            "conditions": {"field": "payee", "pattern": "^cash$", "case_insensitive": true},
            "action": "reject",
            "severity": "critical"
        }"#;
        let rule: PolicyRule = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["rule_type"], "pattern");
        assert_eq!(back["conditions"]["pattern"], "^cash$");
    }
}
