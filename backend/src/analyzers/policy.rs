//! Analyzers: Policy
//!
//! Thin caller of the rule engine. Resolves the account and its statistics,
//! evaluates the rule set, then evaluates velocity rules against the
//! repository's recent deposit counts (the engine cannot see live history).

use crate::analyzers::{Analyzer, StageError, POLICY_ANALYSIS};
use crate::models::record::{AnalysisRecord, StageOutput, StageUpdate};
use crate::models::verdict::{FraudVerdict, RiskLevel, Verdict};
use crate::policy::{RuleAction, RuleCondition, RuleSet, Violation};
use crate::repository::store::{HistoryWindows, Repository};
use crate::rng::RngManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Structured output of the policy stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAnalysis {
    pub policies_evaluated: usize,
    pub violations: Vec<Violation>,
    pub violation_count: usize,

    /// `None` when nothing was violated
    pub highest_severity: Option<RiskLevel>,
    pub flags: Vec<String>,
    pub ruleset_fingerprint: String,
}

impl PolicyAnalysis {
    /// Highest severity as text (`none` without violations)
    pub fn highest_severity_label(&self) -> &'static str {
        self.highest_severity.map(|s| s.as_str()).unwrap_or("none")
    }
}

/// Policy analyzer
#[derive(Debug, Clone)]
pub struct PolicyAnalyzer {
    rules: Arc<RuleSet>,
    repository: Arc<Repository>,
    windows: HistoryWindows,
}

impl PolicyAnalyzer {
    pub fn new(rules: Arc<RuleSet>, repository: Arc<Repository>, windows: HistoryWindows) -> Self {
        Self {
            rules,
            repository,
            windows,
        }
    }

    /// Evaluate velocity rules against recorded deposits
    fn velocity_violations(&self, client_id: &str, as_of: DateTime<Utc>) -> Vec<Violation> {
        self.rules
            .active_rules()
            .filter_map(|rule| match &rule.condition {
                RuleCondition::Velocity(c) => {
                    let count =
                        self.repository
                            .recent_deposit_count(client_id, c.time_window_hours, as_of);
                    (count > c.max_count).then(|| {
                        Violation::from_rule(
                            rule,
                            format!(
                                "{} deposits in last {} hours exceeds limit of {}",
                                count, c.time_window_hours, c.max_count
                            ),
                        )
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn catalog_position(&self, policy_id: &str) -> usize {
        self.rules
            .rules()
            .iter()
            .position(|r| r.policy_id == policy_id)
            .unwrap_or(usize::MAX)
    }
}

impl Analyzer for PolicyAnalyzer {
    fn id(&self) -> &'static str {
        POLICY_ANALYSIS
    }

    fn display_name(&self) -> &'static str {
        "Policy analysis"
    }

    fn analyze(
        &self,
        record: &AnalysisRecord,
        _rng: &mut RngManager,
    ) -> Result<StageUpdate, StageError> {
        let check = &record.check;
        let client = record
            .client
            .as_ref()
            .or_else(|| self.repository.client(&check.client_id));
        let stats = client.map(|c| {
            self.repository
                .statistics(&c.client_id, self.windows.history_days, record.as_of)
        });

        let mut violations = self.rules.evaluate(check, client, stats.as_ref(), record.as_of);
        violations.extend(self.velocity_violations(&check.client_id, record.as_of));
        violations.sort_by_key(|v| self.catalog_position(&v.policy_id));

        let mut flags = Vec::new();
        let mut findings = Vec::new();
        let mut recommendations = Vec::new();

        for violation in &violations {
            flags.push(format!("policy_{}", violation.policy_id));
            findings.push(format!(
                "[{}] {}: {}",
                violation.severity.as_str().to_uppercase(),
                violation.policy_name,
                violation.details
            ));
            recommendations.push(match violation.action {
                RuleAction::Reject => format!(
                    "REJECT per policy {}: {}",
                    violation.policy_id, violation.policy_name
                ),
                RuleAction::FlagAsSuspicious => {
                    format!("FLAG as suspicious per {}", violation.policy_id)
                }
                RuleAction::FlagForReview => format!("REVIEW per policy {}", violation.policy_id),
            });
        }

        let analysis = PolicyAnalysis {
            policies_evaluated: self.rules.active_count(),
            violation_count: violations.len(),
            highest_severity: violations.iter().map(|v| v.severity).max(),
            violations,
            flags: flags.clone(),
            ruleset_fingerprint: self.rules.fingerprint().to_string(),
        };

        debug!(
            check_id = %check.check_id,
            violations = analysis.violation_count,
            highest = analysis.highest_severity_label(),
            "policy evaluation finished"
        );

        let verdict = verdict(&analysis, findings.clone(), record.as_of);

        Ok(StageUpdate::new()
            .with_verdict(verdict)
            .with_output(StageOutput::Policy(analysis))
            .with_flags(flags)
            .with_findings(findings)
            .with_recommendations(recommendations))
    }
}

fn verdict(analysis: &PolicyAnalysis, findings: Vec<String>, at: DateTime<Utc>) -> Verdict {
    let violations = &analysis.violations;

    if violations.is_empty() {
        return Verdict::new(
            POLICY_ANALYSIS,
            FraudVerdict::NotFraud,
            0.85,
            RiskLevel::Low,
            format!(
                "Check passed all {} active fraud detection policies.",
                analysis.policies_evaluated
            ),
            at,
        )
        .with_findings(vec!["No policy violations detected".to_string()])
        .with_recommendations(vec!["Approve - compliant with all policies".to_string()]);
    }

    let count = |level: RiskLevel| violations.iter().filter(|v| v.severity == level).count();
    let critical = count(RiskLevel::Critical);
    let high = count(RiskLevel::High);
    let medium = count(RiskLevel::Medium);
    let rejects = violations
        .iter()
        .filter(|v| v.action == RuleAction::Reject)
        .count();

    let (outcome, level, confidence) = if rejects > 0 || critical > 0 {
        (FraudVerdict::Fraud, RiskLevel::Critical, 0.9 + 0.02 * critical as f64)
    } else if high >= 2 || (high >= 1 && medium >= 2) {
        (FraudVerdict::Fraud, RiskLevel::High, 0.75 + 0.05 * high as f64)
    } else if high >= 1 {
        (FraudVerdict::Review, RiskLevel::High, 0.7)
    } else if medium >= 2 {
        (FraudVerdict::Review, RiskLevel::Medium, 0.65)
    } else {
        (FraudVerdict::Review, RiskLevel::Low, 0.6)
    };

    Verdict::new(
        POLICY_ANALYSIS,
        outcome,
        confidence.min(0.98),
        level,
        reasoning(analysis, critical, high, medium),
        at,
    )
    .with_findings(findings)
    .with_recommendations(verdict_recommendations(violations))
}

fn reasoning(analysis: &PolicyAnalysis, critical: usize, high: usize, medium: usize) -> String {
    let violations = &analysis.violations;
    let mut parts = vec![
        "Policy-Based Analysis Results:".to_string(),
        format!("\nPolicies Evaluated: {}", analysis.policies_evaluated),
        format!("Violations Found: {}", violations.len()),
        "\nViolation Breakdown:".to_string(),
        format!("  - Critical: {}", critical),
        format!("  - High: {}", high),
        format!("  - Medium: {}", medium),
        format!("  - Low: {}", violations.len() - critical - high - medium),
        "\nViolated Policies:".to_string(),
    ];

    for v in violations.iter().take(5) {
        parts.push(format!("  • {} ({})", v.policy_name, v.severity));
    }
    if violations.len() > 5 {
        parts.push(format!("  ... and {} more", violations.len() - 5));
    }

    parts.join("\n")
}

fn verdict_recommendations(violations: &[Violation]) -> Vec<String> {
    const BY_CATEGORY: [(&str, &str); 5] = [
        ("physical_verification", "Verify physical check authenticity"),
        ("amount_analysis", "Verify transaction amount with account holder"),
        ("payee_analysis", "Verify payee identity and legitimacy"),
        ("device_analysis", "Investigate deposit device/method"),
        ("velocity_analysis", "Review recent transaction pattern"),
    ];

    let mut recommendations = Vec::new();

    if violations.iter().any(|v| v.action == RuleAction::Reject) {
        recommendations.push("REJECT: Policy mandates rejection".to_string());
    } else if violations.iter().any(|v| v.severity == RiskLevel::Critical) {
        recommendations
            .push("ESCALATE: Critical policy violation requires senior review".to_string());
    }

    for (category, text) in BY_CATEGORY {
        if violations.iter().any(|v| v.category == category) {
            recommendations.push(text.to_string());
        }
    }

    if recommendations.is_empty() {
        recommendations.push("Review flagged items before approval".to_string());
    }
    recommendations
}
