//! Rule Engine: Interpreter
//!
//! Evaluates one typed rule condition against a `RuleContext`. Every kind is
//! total: a missing field, a non-numeric value where a number is expected, an
//! unknown operator or an uncompilable pattern all mean "not violated".

use crate::policy::context::{FieldValue, RuleContext};
use crate::policy::types::{
    AtomicCondition, AtomicOperator, BooleanCondition, CompoundCondition, ComparisonCondition,
    ComparisonOperator, ListCheckCondition, MembershipOperator, PatternCondition, RuleCondition,
    ThresholdCondition, ThresholdOperator,
};
use regex::{Regex, RegexBuilder};

/// Compile a rule pattern with its case flag
pub fn compile_pattern(condition: &PatternCondition) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&condition.pattern)
        .case_insensitive(condition.case_insensitive)
        .build()
}

/// Evaluate a condition
///
/// Returns `Some(details)` when the rule is violated. `compiled` is the
/// pre-compiled regex for pattern rules; without it the pattern is compiled
/// on the spot.
///
/// # Example
///
/// ```rust
/// use check_fraud_core_rs::policy::{evaluate_condition, RuleCondition, RuleContext};
/// use check_fraud_core_rs::Check;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let check = Check::new("C1", "CL1", 100, "Cash", now).with_watermark(false);
/// let ctx = RuleContext::new(&check, None, None, now);
/// let condition = RuleCondition::from_parts(
///     "boolean",
///     serde_json::json!({"field": "has_watermark", "value": false}),
/// ).unwrap();
///
/// assert_eq!(
///     evaluate_condition(&condition, &ctx, None).as_deref(),
///     Some("has_watermark is false")
/// );
/// ```
pub fn evaluate_condition(
    condition: &RuleCondition,
    ctx: &RuleContext<'_>,
    compiled: Option<&Regex>,
) -> Option<String> {
    match condition {
        RuleCondition::Boolean(c) => evaluate_boolean(c, ctx),
        RuleCondition::Threshold(c) => evaluate_threshold(c, ctx),
        RuleCondition::Pattern(c) => evaluate_pattern(c, ctx, compiled),
        RuleCondition::Compound(c) => evaluate_compound(c, ctx),
        RuleCondition::ListCheck(c) => evaluate_list_check(c, ctx),
        RuleCondition::Comparison(c) => evaluate_comparison(c, ctx),
        // Velocity needs live history; the policy stage evaluates it
        RuleCondition::Velocity(_) => None,
        // Amount/words consistency needs OCR
        RuleCondition::Validation(_) => None,
        RuleCondition::Unsupported { .. } => None,
    }
}

// ============================================================================
// PER-KIND EVALUATION
// ============================================================================

fn evaluate_boolean(c: &BooleanCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let actual = ctx.field(&c.field)?;
    actual
        .equals_json(&c.value)
        .then(|| format!("{} is {}", c.field, actual))
}

fn evaluate_threshold(c: &ThresholdCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let value = ctx.field(&c.field)?.as_f64()?;

    match c.operator {
        ThresholdOperator::ExceedsAverageByPercent => {
            let avg = ctx.stats?.average_amount;
            if avg <= 0.0 {
                return None;
            }
            let percent_over = (value - avg) / avg * 100.0;
            (percent_over > c.threshold).then(|| {
                format!(
                    "Amount ${} exceeds average ${:.2} by {:.1}%",
                    value, avg, percent_over
                )
            })
        }
        ThresholdOperator::LessThan => (value < c.threshold)
            .then(|| format!("{} ({}) is less than {}", c.field, value, c.threshold)),
        ThresholdOperator::GreaterThan => (value > c.threshold)
            .then(|| format!("{} ({}) exceeds {}", c.field, value, c.threshold)),
        ThresholdOperator::Unsupported => None,
    }
}

fn evaluate_pattern(
    c: &PatternCondition,
    ctx: &RuleContext<'_>,
    compiled: Option<&Regex>,
) -> Option<String> {
    let value = ctx.field(&c.field)?.to_string();

    let owned;
    let regex = match compiled {
        Some(regex) => regex,
        None => {
            owned = compile_pattern(c).ok()?;
            &owned
        }
    };

    regex
        .is_match(&value)
        .then(|| format!("{} matches suspicious pattern: {}", c.field, value))
}

fn evaluate_compound(c: &CompoundCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let (conditions, require_all) = if !c.all.is_empty() {
        (&c.all, true)
    } else if !c.any.is_empty() {
        (&c.any, false)
    } else {
        return None;
    };

    let results: Vec<Option<String>> = conditions
        .iter()
        .map(|atomic| evaluate_atomic(atomic, ctx))
        .collect();

    let violated = if require_all {
        results.iter().all(Option::is_some)
    } else {
        results.iter().any(Option::is_some)
    };
    if !violated {
        return None;
    }

    Some(results.into_iter().flatten().collect::<Vec<_>>().join("; "))
}

/// Evaluate one nested condition; a missing field is false
fn evaluate_atomic(c: &AtomicCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let actual = ctx.field(&c.field)?;

    let violated = match c.operator {
        AtomicOperator::LessThan => compare_numbers(&actual, c.value.as_ref(), |a, b| a < b),
        AtomicOperator::GreaterThan => compare_numbers(&actual, c.value.as_ref(), |a, b| a > b),
        AtomicOperator::Equals => c
            .value
            .as_ref()
            .map(|expected| actual.equals_json(expected))
            .unwrap_or(false),
        AtomicOperator::IsRoundNumber => match actual.as_f64() {
            Some(v) if c.precision != 0.0 => v % c.precision == 0.0,
            _ => false,
        },
        AtomicOperator::Unsupported => false,
    };
    if !violated {
        return None;
    }

    let operand = match c.operator {
        AtomicOperator::IsRoundNumber => c.precision.to_string(),
        _ => c
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string()),
    };
    Some(format!(
        "{}: {} {} {}",
        c.field,
        actual,
        c.operator.as_str(),
        operand
    ))
}

fn compare_numbers(
    actual: &FieldValue,
    expected: Option<&serde_json::Value>,
    op: impl Fn(f64, f64) -> bool,
) -> bool {
    match (actual.as_f64(), expected.and_then(|v| v.as_f64())) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

fn evaluate_list_check(c: &ListCheckCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let value = ctx.field(&c.field)?.to_string();
    let value_lower = value.to_lowercase();

    // Without an account the reference list is empty
    let reference: Vec<String> = ctx
        .field(&c.reference)
        .map(|v| v.as_list())
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.to_lowercase())
        .collect();
    let contained = reference.contains(&value_lower);

    let subject = humanize(&c.field);
    let list_name = humanize(c.reference.rsplit('.').next().unwrap_or(&c.reference)).to_lowercase();
    match c.operator {
        MembershipOperator::NotIn => {
            (!contained).then(|| format!("{} '{}' not in {}", subject, value, list_name))
        }
        MembershipOperator::In => {
            contained.then(|| format!("{} '{}' found in {}", subject, value, list_name))
        }
        MembershipOperator::Unsupported => None,
    }
}

fn evaluate_comparison(c: &ComparisonCondition, ctx: &RuleContext<'_>) -> Option<String> {
    let value = ctx.field(&c.field)?.to_string();
    let reference = ctx.field(&c.reference)?.to_string();
    let same = value.to_lowercase() == reference.to_lowercase();

    match c.operator {
        ComparisonOperator::Equals => {
            same.then(|| format!("Check {} '{}' matches {}", c.field, value, c.reference))
        }
        ComparisonOperator::NotEquals => {
            (!same).then(|| format!("Check {} '{}' differs from {}", c.field, value, c.reference))
        }
        ComparisonOperator::Unsupported => None,
    }
}

/// `typical_payees` → `Typical payees`
fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("payee"), "Payee");
        assert_eq!(humanize("typical_payees"), "Typical payees");
        assert_eq!(humanize(""), "");
    }
}
