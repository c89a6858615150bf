//! Rule Engine: Rule Set
//!
//! Loaded, validated and immutable collection of policy rules. Patterns are
//! compiled once at load. The set is shared read-only between runs via `Arc`.

use crate::models::check::Check;
use crate::models::client::Client;
use crate::models::verdict::RiskLevel;
use crate::policy::context::RuleContext;
use crate::policy::interpreter::{compile_pattern, evaluate_condition};
use crate::policy::types::{PolicyRule, RuleCondition, Violation};
use crate::policy::validation::{validate_rules, ValidationError};
use crate::repository::stats::TransactionStatistics;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Built-in rule catalog
const DEFAULT_CATALOG: &str = include_str!("../../policies/fraud_rules.json");

/// Errors raised while loading a rule set
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("Failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule set: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rule set validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// File format of a rule catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetDef {
    #[serde(default = "default_version")]
    pub version: String,
    pub policies: Vec<PolicyRule>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Counts of active rules by category and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetSummary {
    pub total_policies: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<RiskLevel, usize>,
    pub categories: Vec<String>,
}

/// Validated rule collection
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    rules: Vec<PolicyRule>,
    patterns: HashMap<String, Regex>,
    fingerprint: String,
}

impl RuleSet {
    /// Build from rules, validating them
    pub fn new(version: impl Into<String>, rules: Vec<PolicyRule>) -> Result<Self, RuleSetError> {
        validate_rules(&rules).map_err(RuleSetError::Validation)?;

        let mut patterns = HashMap::new();
        for rule in &rules {
            if let RuleCondition::Pattern(condition) = &rule.condition {
                // Validation guarantees the pattern compiles
                if let Ok(regex) = compile_pattern(condition) {
                    patterns.insert(rule.policy_id.clone(), regex);
                }
            }
        }

        let fingerprint = compute_fingerprint(&rules)?;

        Ok(Self {
            version: version.into(),
            rules,
            patterns,
            fingerprint,
        })
    }

    /// Parse and validate a JSON catalog
    ///
    /// # Example
    /// ```
    /// use check_fraud_core_rs::policy::RuleSet;
    ///
    /// let json = r#"{"version": "1.0", "policies": [{
    ///     "policy_id": "P1", "name": "Cash payee",
    ///     "rule_type": "pattern",
    ///     "conditions": {"field": "payee", "pattern": "^cash$", "case_insensitive": true},
    ///     "action": "flag_for_review", "severity": "high"
    /// }]}"#;
    /// let rules = RuleSet::from_json(json).unwrap();
    /// assert_eq!(rules.len(), 1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let def: RuleSetDef = serde_json::from_str(json)?;
        Self::new(def.version, def.policies)
    }

    /// Load a JSON catalog from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The built-in twelve-rule catalog
    pub fn default_catalog() -> Result<Self, RuleSetError> {
        Self::from_json(DEFAULT_CATALOG)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 of the canonical rule JSON
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &PolicyRule> {
        self.rules.iter().filter(|r| r.is_active)
    }

    pub fn active_count(&self) -> usize {
        self.active_rules().count()
    }

    pub fn get(&self, policy_id: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|r| r.policy_id == policy_id)
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a PolicyRule> {
        self.active_rules().filter(move |r| r.category == category)
    }

    /// Evaluate every active rule; violations in catalog order
    ///
    /// Pure: the same inputs always give the same violations.
    pub fn evaluate(
        &self,
        check: &Check,
        client: Option<&Client>,
        stats: Option<&TransactionStatistics>,
        as_of: DateTime<Utc>,
    ) -> Vec<Violation> {
        let ctx = RuleContext::new(check, client, stats, as_of);

        self.active_rules()
            .filter_map(|rule| {
                let compiled = self.patterns.get(&rule.policy_id);
                evaluate_condition(&rule.condition, &ctx, compiled).map(|details| {
                    debug!(
                        policy_id = %rule.policy_id,
                        severity = %rule.severity,
                        details = %details,
                        "policy violated"
                    );
                    Violation::from_rule(rule, details)
                })
            })
            .collect()
    }

    /// Counts of active rules by category and severity
    pub fn summary(&self) -> RuleSetSummary {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        let mut categories: Vec<String> = Vec::new();

        for rule in self.active_rules() {
            *by_category.entry(rule.category.clone()).or_insert(0) += 1;
            *by_severity.entry(rule.severity).or_insert(0) += 1;
            if !categories.contains(&rule.category) {
                categories.push(rule.category.clone());
            }
        }

        RuleSetSummary {
            total_policies: self.active_count(),
            by_category,
            by_severity,
            categories,
        }
    }

    /// Markdown rendering of the active rules
    pub fn documentation(&self) -> String {
        let mut parts = vec!["# Fraud Detection Policies\n".to_string()];

        for rule in self.active_rules() {
            parts.push(format!("\n## {} ({})", rule.name, rule.policy_id));
            parts.push(format!("**Category:** {}", rule.category));
            parts.push(format!("**Severity:** {}", rule.severity));
            parts.push(format!("**Description:** {}", rule.description));
            parts.push(format!("**Action:** {}", rule.action));
            parts.push(format!("**Conditions:** {}", rule.condition.to_json()));
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// Hash the canonical (key-sorted) JSON form of the rules
fn compute_fingerprint(rules: &[PolicyRule]) -> Result<String, RuleSetError> {
    use serde_json::Value;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(serde_json::to_value(rules)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_loads() {
        let rules = RuleSet::default_catalog().unwrap();
        assert_eq!(rules.len(), 12);
        assert_eq!(rules.active_count(), 12);
        assert_eq!(rules.fingerprint().len(), 64);
        assert!(rules.get("POL011").is_some());
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = RuleSet::default_catalog().unwrap();
        let b = RuleSet::default_catalog().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_summary_counts() {
        let summary = RuleSet::default_catalog().unwrap().summary();
        assert_eq!(summary.total_policies, 12);
        assert_eq!(summary.by_severity.get(&RiskLevel::Critical), Some(&3));
        assert_eq!(summary.by_category.get("amount_analysis"), Some(&3));
        assert_eq!(summary.categories[0], "amount_analysis");
    }

    #[test]
    fn test_documentation_lists_rules() {
        let doc = RuleSet::default_catalog().unwrap().documentation();
        assert!(doc.starts_with("# Fraud Detection Policies"));
        assert!(doc.contains("## Emulator Detection (POL011)"));
    }
}
