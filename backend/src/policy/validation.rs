//! Rule Engine: Rule Set Validation
//!
//! Load-time checks so evaluation can stay total:
//! - policy id uniqueness
//! - pattern compilability
//! - numeric sanity of thresholds, windows and precisions
//!
//! All problems are collected and reported together.

use crate::core::clock::MAX_WINDOW_HOURS;
use crate::policy::interpreter::compile_pattern;
use crate::policy::types::{AtomicOperator, PolicyRule, RuleCondition};
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate policy ID: {0}")]
    DuplicatePolicyId(String),

    #[error("Policy ID must not be empty (rule '{0}')")]
    EmptyPolicyId(String),

    #[error("Policy {policy_id}: invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        policy_id: String,
        pattern: String,
        reason: String,
    },

    #[error("Policy {policy_id}: threshold must be finite")]
    NonFiniteThreshold { policy_id: String },

    #[error("Policy {policy_id}: time window must be within 1..=876600h, got {hours}h")]
    InvalidTimeWindow { policy_id: String, hours: i64 },

    #[error("Policy {policy_id}: round-number precision must be positive, got {precision}")]
    InvalidPrecision { policy_id: String, precision: f64 },
}

/// Validation result
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a list of rules before use
pub fn validate_rules(rules: &[PolicyRule]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for rule in rules {
        if rule.policy_id.trim().is_empty() {
            errors.push(ValidationError::EmptyPolicyId(rule.name.clone()));
        } else if !seen.insert(rule.policy_id.as_str()) {
            errors.push(ValidationError::DuplicatePolicyId(rule.policy_id.clone()));
        }

        errors.extend(validate_condition(rule));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_condition(rule: &PolicyRule) -> Vec<ValidationError> {
    let policy_id = || rule.policy_id.clone();
    let mut errors = Vec::new();

    match &rule.condition {
        RuleCondition::Pattern(c) => {
            if let Err(e) = compile_pattern(c) {
                errors.push(ValidationError::InvalidPattern {
                    policy_id: policy_id(),
                    pattern: c.pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }
        RuleCondition::Threshold(c) => {
            if !c.threshold.is_finite() {
                errors.push(ValidationError::NonFiniteThreshold {
                    policy_id: policy_id(),
                });
            }
        }
        RuleCondition::Velocity(c) => {
            if !(1..=MAX_WINDOW_HOURS).contains(&c.time_window_hours) {
                errors.push(ValidationError::InvalidTimeWindow {
                    policy_id: policy_id(),
                    hours: c.time_window_hours,
                });
            }
        }
        RuleCondition::Compound(c) => {
            for atomic in c.all.iter().chain(c.any.iter()) {
                if atomic.operator == AtomicOperator::IsRoundNumber
                    && !(atomic.precision.is_finite() && atomic.precision > 0.0)
                {
                    errors.push(ValidationError::InvalidPrecision {
                        policy_id: policy_id(),
                        precision: atomic.precision,
                    });
                }
            }
        }
        _ => {}
    }

    errors
}
