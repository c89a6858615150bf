//! Fraud Policy Rule Engine
//!
//! Declarative fraud rules loaded from JSON and evaluated against a check,
//! its account and the account's history statistics.
//!
//! # Overview
//!
//! Each rule carries a `rule_type` and a `conditions` object. At load time
//! the pair is parsed into a typed [`RuleCondition`]; unknown kinds are kept
//! as `Unsupported` and never fire. Evaluation is pure and total: a missing
//! field or a malformed operand means "not violated", never an error.
//!
//! Rule kinds:
//! 1. **boolean**: field equals a literal
//! 2. **threshold**: numeric bound, or percent over the historical average
//! 3. **pattern**: regex over a field's text
//! 4. **compound**: `all`/`any` of atomic comparisons
//! 5. **list_check**: membership in an account list
//! 6. **comparison**: equality between two fields
//! 7. **velocity**: evaluated by the policy stage against live history
//! 8. **validation**: inert (needs OCR)
//!
//! Architecture:
//! - types.rs: rule, condition and violation types
//! - context.rs: field resolution
//! - interpreter.rs: per-kind evaluation
//! - validation.rs: load-time checks
//! - ruleset.rs: the loaded catalog

pub mod context;
pub mod interpreter;
pub mod ruleset;
pub mod types;
pub mod validation;

pub use context::{FieldValue, RuleContext};
pub use interpreter::{compile_pattern, evaluate_condition};
pub use ruleset::{RuleSet, RuleSetDef, RuleSetError, RuleSetSummary};
pub use types::{
    AtomicCondition, AtomicOperator, BooleanCondition, ComparisonCondition, ComparisonOperator,
    CompoundCondition, ConditionError, ListCheckCondition, MembershipOperator, PatternCondition,
    PolicyRule, RuleAction, RuleCondition, ThresholdCondition, ThresholdOperator,
    ValidationCondition, VelocityCondition, Violation,
};
pub use validation::{validate_rules, ValidationError, ValidationResult};
