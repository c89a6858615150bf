//! Analyzers: Holistic review
//!
//! Formats everything the earlier stages found into text blocks and asks a
//! reviewer collaborator for an overall opinion. The reviewer runs on a
//! helper thread bounded by a timeout; a reviewer error or timeout becomes a
//! low-confidence review verdict plus an entry in the record's error list.

use crate::analyzers::history::TransactionAnalysis;
use crate::analyzers::physical::CheckAnalysis;
use crate::analyzers::policy::PolicyAnalysis;
use crate::analyzers::{Analyzer, StageError, HOLISTIC_REVIEW};
use crate::core::format::{format_dollars, percent};
use crate::models::check::Check;
use crate::models::client::Client;
use crate::models::record::{AnalysisRecord, StageOutput, StageUpdate};
use crate::models::verdict::{FraudVerdict, RiskLevel, Verdict};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// REVIEWER CONTRACT
// ============================================================================

/// Reviewer failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReviewerError {
    #[error("reviewer unavailable: {0}")]
    Unavailable(String),

    #[error("reviewer timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("malformed reviewer response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Failed(String),
}

/// Evidence handed to a reviewer, one text block per source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub check_info: String,
    pub client_info: String,
    pub check_analysis: String,
    pub transaction_analysis: String,
    pub policy_analysis: String,
}

impl ReviewRequest {
    /// Build the request from the record's current contents
    pub fn from_record(record: &AnalysisRecord) -> Self {
        Self {
            check_info: format_check_info(&record.check),
            client_info: format_client_info(record.client.as_ref()),
            check_analysis: format_check_analysis(record.check_analysis.as_ref()),
            transaction_analysis: format_transaction_analysis(
                record.transaction_analysis.as_ref(),
            ),
            policy_analysis: format_policy_analysis(record.policy_analysis.as_ref()),
        }
    }

    /// All blocks as one markdown document
    pub fn render(&self) -> String {
        format!(
            "## Check Information\n{}\n\n## Client Information\n{}\n\n\
             ## Physical Check Analysis Results\n{}\n\n## Transaction History Analysis\n{}\n\n\
             ## Policy Violation Summary\n{}\n",
            self.check_info,
            self.client_info,
            self.check_analysis,
            self.transaction_analysis,
            self.policy_analysis
        )
    }
}

/// One risk factor named by the reviewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub severity: String,
    pub details: String,
}

/// Reviewer opinion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub verdict: FraudVerdict,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl ReviewResponse {
    /// Parse a JSON reply leniently
    ///
    /// Text around the outermost JSON object is ignored. Unknown verdicts
    /// become `review`, unknown risk levels `medium`, a missing confidence
    /// 0.5; confidence is clamped to [0, 1].
    ///
    /// # Example
    /// ```
    /// use check_fraud_core_rs::analyzers::ReviewResponse;
    /// use check_fraud_core_rs::{FraudVerdict, RiskLevel};
    ///
    /// let reply = r#"Here you go: {"verdict": "maybe", "confidence": 3, "risk_level": "high"}"#;
    /// let response = ReviewResponse::from_json(reply).unwrap();
    /// assert_eq!(response.verdict, FraudVerdict::Review);
    /// assert_eq!(response.confidence, 1.0);
    /// assert_eq!(response.risk_level, RiskLevel::High);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, ReviewerError> {
        let start = text.find('{');
        let end = text.rfind('}');
        let body = match (start, end) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => return Err(ReviewerError::Malformed("no JSON object found".to_string())),
        };

        let value: JsonValue =
            serde_json::from_str(body).map_err(|e| ReviewerError::Malformed(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| ReviewerError::Malformed("expected a JSON object".to_string()))?;

        let text_field = |key: &str| obj.get(key).and_then(JsonValue::as_str);
        let string_list = |key: &str| -> Vec<String> {
            obj.get(key)
                .and_then(JsonValue::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|v| match v {
                            JsonValue::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        let verdict = text_field("verdict")
            .and_then(FraudVerdict::parse)
            .filter(|v| *v != FraudVerdict::Unknown)
            .unwrap_or(FraudVerdict::Review);
        let risk_level = text_field("risk_level")
            .and_then(RiskLevel::parse)
            .unwrap_or(RiskLevel::Medium);
        let confidence = obj
            .get("confidence")
            .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0.5);

        let risk_factors = obj
            .get("risk_factors")
            .and_then(JsonValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(JsonValue::as_object)
                    .map(|rf| {
                        let field = |key: &str, default: &str| {
                            rf.get(key)
                                .and_then(JsonValue::as_str)
                                .unwrap_or(default)
                                .to_string()
                        };
                        RiskFactor {
                            factor: field("factor", "Unknown"),
                            severity: field("severity", "unknown"),
                            details: field("details", ""),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            verdict,
            confidence: crate::models::verdict::clamp_confidence(confidence),
            risk_level,
            key_findings: string_list("key_findings"),
            risk_factors,
            reasoning: text_field("reasoning").map(str::to_string),
            recommendations: string_list("recommendations"),
        })
    }
}

/// Holistic reviewer collaborator
pub trait HolisticReviewer: Send + Sync {
    fn name(&self) -> &str;

    fn review(&self, request: &ReviewRequest) -> Result<ReviewResponse, ReviewerError>;
}

// ============================================================================
// KEYWORD REVIEWER
// ============================================================================

/// Deterministic local reviewer
///
/// Scans the evidence blocks for known red-flag markers and weighs them by
/// severity. Same request, same response.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordReviewer;

impl KeywordReviewer {
    fn factors(request: &ReviewRequest) -> Vec<RiskFactor> {
        let mut factors = Vec::new();
        let mut add = |factor: &str, severity: RiskLevel, details: &str| {
            factors.push(RiskFactor {
                factor: factor.to_string(),
                severity: severity.as_str().to_string(),
                details: details.to_string(),
            });
        };

        let physical = &request.check_analysis;
        if physical.contains("**Watermark**: NOT DETECTED") {
            add("Missing watermark", RiskLevel::Critical, "Bank watermark absent from the document");
        }
        if physical.contains("**Signature**: MISSING") {
            add("Missing signature", RiskLevel::Critical, "Check is unsigned");
        }
        if physical.contains("**MICR Line**: INVALID") {
            add("Invalid MICR line", RiskLevel::High, "MICR data does not validate");
        }
        if physical.contains("manipulation_suspected") {
            add("Image manipulation", RiskLevel::High, "Image shows signs of editing");
        }

        let device = request
            .check_info
            .lines()
            .find(|l| l.contains("Device:"))
            .map(str::to_lowercase)
            .unwrap_or_default();
        if ["emulator", "rooted", "jailbroken"].iter().any(|d| device.contains(d)) {
            add("Suspicious deposit device", RiskLevel::Critical, "Deposit captured on a compromised device");
        }

        if request.client_info == CLIENT_UNAVAILABLE {
            add("Unknown client", RiskLevel::High, "Account holder could not be resolved");
        }

        let history = &request.transaction_analysis;
        if history.contains("- Suspicious: true") {
            add("Suspicious payee", RiskLevel::High, "Payee name matches high-risk keywords");
        } else if history.contains("- Known Payee: false") {
            add("Unknown payee", RiskLevel::Medium, "Payee not seen in account history");
        }
        if history.contains("- Self-Payee: true") {
            add("Self-payee", RiskLevel::Medium, "Check is payable to the account holder");
        }
        if history.contains("amount_anomaly") {
            add("Unusual amount", RiskLevel::Medium, "Amount departs from historical pattern");
        }

        let policy = &request.policy_analysis;
        if policy.contains("**Highest Severity**: critical") {
            add("Critical policy violation", RiskLevel::Critical, "At least one critical policy fired");
        } else if policy.contains("**Highest Severity**: high") {
            add("High-severity policy violation", RiskLevel::High, "At least one high-severity policy fired");
        }

        factors
    }
}

impl HolisticReviewer for KeywordReviewer {
    fn name(&self) -> &str {
        "keyword"
    }

    fn review(&self, request: &ReviewRequest) -> Result<ReviewResponse, ReviewerError> {
        let factors = Self::factors(request);

        let weight = |severity: &str| match severity {
            "critical" => 0.4,
            "high" => 0.25,
            "medium" => 0.1,
            _ => 0.05,
        };
        let score: f64 = factors.iter().map(|f| weight(&f.severity)).sum::<f64>().min(1.0);
        let any_critical = factors.iter().any(|f| f.severity == "critical");

        let (verdict, risk_level, confidence, recommendation) = if score >= 0.6 {
            (
                FraudVerdict::Fraud,
                if any_critical { RiskLevel::Critical } else { RiskLevel::High },
                0.7 + 0.25 * score,
                "REJECT: Multiple independent risk factors present",
            )
        } else if score >= 0.25 {
            (
                FraudVerdict::Review,
                if any_critical { RiskLevel::High } else { RiskLevel::Medium },
                0.6,
                "REVIEW: Mixed evidence requires analyst judgment",
            )
        } else {
            (
                FraudVerdict::NotFraud,
                RiskLevel::Low,
                0.8 - score,
                "APPROVE: No material risk factors identified",
            )
        };

        let reasoning = if factors.is_empty() {
            "No red flags found across physical, historical and policy evidence.".to_string()
        } else {
            format!(
                "{} risk factor(s) found; combined weight {:.2}.",
                factors.len(),
                score
            )
        };

        Ok(ReviewResponse {
            verdict,
            confidence,
            risk_level,
            key_findings: factors.iter().map(|f| f.details.clone()).collect(),
            risk_factors: factors,
            reasoning: Some(reasoning),
            recommendations: vec![recommendation.to_string()],
        })
    }
}

// ============================================================================
// STAGE
// ============================================================================

/// Structured output of the holistic stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolisticAnalysis {
    pub reviewer: String,
    pub request: ReviewRequest,
    pub response: Option<ReviewResponse>,
    pub error: Option<String>,
}

/// Holistic analyzer
pub struct HolisticAnalyzer {
    reviewer: Arc<dyn HolisticReviewer>,
    timeout: Duration,
}

impl HolisticAnalyzer {
    pub fn new(reviewer: Arc<dyn HolisticReviewer>, timeout: Duration) -> Self {
        Self { reviewer, timeout }
    }

    /// Run the reviewer on a helper thread, bounded by the timeout
    fn call_reviewer(&self, request: &ReviewRequest) -> Result<ReviewResponse, ReviewerError> {
        let (tx, rx) = mpsc::channel();
        let reviewer = Arc::clone(&self.reviewer);
        let request = request.clone();

        thread::Builder::new()
            .name("holistic-reviewer".to_string())
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(reviewer.review(&request));
            })
            .map_err(|e| ReviewerError::Unavailable(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ReviewerError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ReviewerError::Failed(
                "reviewer thread terminated without a response".to_string(),
            )),
        }
    }

    fn fallback(&self, record: &AnalysisRecord, request: ReviewRequest, error: ReviewerError) -> StageUpdate {
        warn!(
            check_id = %record.check.check_id,
            reviewer = self.reviewer.name(),
            error = %error,
            "holistic review failed, using fallback verdict"
        );

        let verdict = Verdict::new(
            HOLISTIC_REVIEW,
            FraudVerdict::Review,
            0.3,
            RiskLevel::Medium,
            format!("Holistic review failed: {}. Manual review required.", error),
            record.as_of,
        )
        .with_findings(vec!["Holistic review could not be completed".to_string()])
        .with_recommendations(vec![
            "Manual review required due to analysis failure".to_string()
        ]);

        let analysis = HolisticAnalysis {
            reviewer: self.reviewer.name().to_string(),
            request,
            response: None,
            error: Some(error.to_string()),
        };

        StageUpdate::new()
            .with_verdict(verdict)
            .with_output(StageOutput::Holistic(analysis))
            .with_error(format!("Holistic review error: {}", error))
    }
}

impl Analyzer for HolisticAnalyzer {
    fn id(&self) -> &'static str {
        HOLISTIC_REVIEW
    }

    fn display_name(&self) -> &'static str {
        "Holistic review"
    }

    fn analyze(
        &self,
        record: &AnalysisRecord,
        _rng: &mut RngManager,
    ) -> Result<StageUpdate, StageError> {
        let request = ReviewRequest::from_record(record);

        let response = match self.call_reviewer(&request) {
            Ok(response) => response,
            Err(error) => return Ok(self.fallback(record, request, error)),
        };

        debug!(
            reviewer = self.reviewer.name(),
            verdict = %response.verdict,
            "holistic review returned"
        );

        let verdict = response_to_verdict(&response, record);
        let analysis = HolisticAnalysis {
            reviewer: self.reviewer.name().to_string(),
            request,
            response: Some(response.clone()),
            error: None,
        };

        Ok(StageUpdate::new()
            .with_verdict(verdict)
            .with_output(StageOutput::Holistic(analysis))
            .with_findings(response.key_findings)
            .with_recommendations(response.recommendations))
    }
}

fn response_to_verdict(response: &ReviewResponse, record: &AnalysisRecord) -> Verdict {
    let mut reasoning = response
        .reasoning
        .clone()
        .unwrap_or_else(|| "Analysis completed.".to_string());

    if !response.risk_factors.is_empty() {
        reasoning.push_str("\n\nRisk Factors:\n");
        let lines: Vec<String> = response
            .risk_factors
            .iter()
            .map(|rf| format!("- {} ({}): {}", rf.factor, rf.severity, rf.details))
            .collect();
        reasoning.push_str(&lines.join("\n"));
    }

    Verdict::new(
        HOLISTIC_REVIEW,
        response.verdict,
        response.confidence,
        response.risk_level,
        reasoning,
        record.as_of,
    )
    .with_findings(response.key_findings.clone())
    .with_recommendations(response.recommendations.clone())
}

// ============================================================================
// EVIDENCE FORMATTING
// ============================================================================

const CLIENT_UNAVAILABLE: &str = "Client information not available.";

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

fn format_check_info(check: &Check) -> String {
    let metadata = &check.metadata;
    let account_tail = if check.account_number.is_empty() {
        "N/A".to_string()
    } else {
        let chars: Vec<char> = check.account_number.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };

    [
        format!("- Check ID: {}", check.check_id),
        format!("- Check Number: {}", or_na(&check.check_number)),
        format!("- Date: {}", check.date.format("%Y-%m-%d")),
        format!("- Amount: ${}", format_dollars(check.amount_dollars())),
        format!("- Amount Written: {}", or_na(&check.amount_written)),
        format!("- Payee: {}", check.payee),
        format!("- Memo: {}", check.memo.as_deref().unwrap_or("N/A")),
        format!("- Bank: {}", or_na(&check.bank_name)),
        format!("- Routing Number: {}", or_na(&check.routing_number)),
        format!("- Account Number: {} (last 4)", account_tail),
        format!("- Has Watermark: {}", check.has_watermark),
        format!("- Signature Present: {}", check.signature_present),
        format!("- Deposit Source: {}", metadata.source.as_deref().unwrap_or("Unknown")),
        format!("- Device: {}", metadata.device.as_deref().unwrap_or("Unknown")),
        format!("- Existing Flags: {}", bracketed(&metadata.flags)),
    ]
    .join("\n")
}

fn format_client_info(client: Option<&Client>) -> String {
    let client = match client {
        Some(client) => client,
        None => return CLIENT_UNAVAILABLE.to_string(),
    };

    let payees = if client.typical_payees.is_empty() {
        "None recorded".to_string()
    } else {
        client.typical_payees.join(", ")
    };

    [
        format!("- Client ID: {}", client.client_id),
        format!("- Name: {}", client.name),
        format!("- Account Opened: {}", client.account_opened_date.format("%Y-%m-%d")),
        format!(
            "- Average Monthly Transactions: {:.1}",
            client.average_monthly_transactions
        ),
        format!("- Average Check Amount: ${}", format_dollars(client.average_check_amount)),
        format!("- Typical Payees: {}", payees),
        format!("- Client Risk Score: {:.2}", client.risk_score),
    ]
    .join("\n")
}

fn format_check_analysis(analysis: Option<&CheckAnalysis>) -> String {
    let a = match analysis {
        Some(a) => a,
        None => return "Physical check analysis not yet performed.".to_string(),
    };

    [
        format!(
            "**Watermark**: {} (Confidence: {})",
            if a.watermark.detected { "Detected" } else { "NOT DETECTED" },
            percent(a.watermark.confidence)
        ),
        format!("  - Risk: {}", a.watermark_risk.risk_level),
        format!(
            "**Signature**: {}, {}",
            if a.signature.present { "Present" } else { "MISSING" },
            if a.signature.valid { "Valid" } else { "Invalid" }
        ),
        format!("  - Confidence: {}", percent(a.signature.confidence)),
        format!(
            "  - Forgery Indicators: {}",
            bracketed(&a.signature.forgery_indicators)
        ),
        format!("**MICR Line**: {}", if a.micr.valid { "Valid" } else { "INVALID" }),
        format!("  - Anomalies: {}", bracketed(&a.micr.anomalies)),
        format!("**Image Quality**: {}", percent(a.image_quality.overall_score)),
        format!(
            "  - Manipulation Check: {} (confidence {})",
            if a.manipulation.detected { "suspected" } else { "clear" },
            percent(a.manipulation.confidence)
        ),
        format!("\n**Overall Physical Risk**: {}", percent(a.overall_risk)),
        format!("**Physical Flags**: {}", bracketed(&a.flags)),
    ]
    .join("\n")
}

fn format_transaction_analysis(analysis: Option<&TransactionAnalysis>) -> String {
    let a = match analysis {
        Some(a) => a,
        None => return "Transaction history analysis not yet performed.".to_string(),
    };

    let mut parts = vec![format!("**Client Found**: {}", a.client_found)];

    if a.statistics.has_history() {
        let s = &a.statistics;
        parts.push("**Transaction Statistics**:".to_string());
        parts.push(format!("  - Total Transactions: {}", s.total_transactions));
        parts.push(format!("  - Average Amount: ${}", format_dollars(s.average_amount)));
        parts.push(format!("  - Max Amount: ${}", format_dollars(s.max_amount)));
        parts.push(format!("  - Transactions/Month: {:.1}", s.transactions_per_month));
    }

    parts.push(format!(
        "**Amount Anomaly Score**: {}",
        percent(a.amount_anomaly_score)
    ));

    let (known, suspicious, self_payee) = a
        .payee
        .as_ref()
        .map(|p| (p.is_known, p.is_suspicious, p.is_self_payee))
        .unwrap_or((false, !a.client_found, false));
    parts.push("**Payee Analysis**:".to_string());
    parts.push(format!("  - Known Payee: {}", known));
    parts.push(format!("  - Suspicious: {}", suspicious));
    parts.push(format!("  - Self-Payee: {}", self_payee));

    let (deposits, hours) = a
        .velocity
        .as_ref()
        .map(|v| (v.recent_deposits, v.window_hours))
        .unwrap_or((0, 24));
    parts.push(format!("**Velocity**: {} deposits in {}h", deposits, hours));
    parts.push(format!("**Historical Flags**: {}", bracketed(&a.flags)));

    parts.join("\n")
}

fn format_policy_analysis(analysis: Option<&PolicyAnalysis>) -> String {
    let a = match analysis {
        Some(a) => a,
        None => return "Policy analysis not yet performed.".to_string(),
    };

    let mut parts = vec![
        format!("**Policies Evaluated**: {}", a.policies_evaluated),
        format!("**Violations Found**: {}", a.violation_count),
        format!("**Highest Severity**: {}", a.highest_severity_label()),
    ];

    if !a.violations.is_empty() {
        parts.push("\n**Violated Policies**:".to_string());
        for v in &a.violations {
            parts.push(format!("  - [{}] {}: {}", v.severity, v.policy_name, v.details));
        }
    }

    parts.push(format!("\n**Policy Flags**: {}", bracketed(&a.flags)));
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FailingReviewer;

    impl HolisticReviewer for FailingReviewer {
        fn name(&self) -> &str {
            "failing"
        }

        fn review(&self, _request: &ReviewRequest) -> Result<ReviewResponse, ReviewerError> {
            Err(ReviewerError::Unavailable("connection refused".to_string()))
        }
    }

    fn record() -> AnalysisRecord {
        let now = Utc::now();
        AnalysisRecord::new(Check::new("C1", "CL1", 10_000, "Payee", now), None, now)
    }

    #[test]
    fn test_from_json_defaults() {
        let response = ReviewResponse::from_json("{}").unwrap();
        assert_eq!(response.verdict, FraudVerdict::Review);
        assert_eq!(response.risk_level, RiskLevel::Medium);
        assert_eq!(response.confidence, 0.5);
        assert!(response.reasoning.is_none());
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        assert!(matches!(
            ReviewResponse::from_json("no idea"),
            Err(ReviewerError::Malformed(_))
        ));
    }

    #[test]
    fn test_risk_factors_appended_to_reasoning() {
        let response = ReviewResponse::from_json(
            r#"{"verdict": "fraud", "confidence": 0.9, "risk_level": "critical",
                "reasoning": "Clear fraud.",
                "risk_factors": [{"factor": "Payee", "severity": "high", "details": "Cash"}]}"#,
        )
        .unwrap();
        let verdict = response_to_verdict(&response, &record());
        assert_eq!(
            verdict.reasoning,
            "Clear fraud.\n\nRisk Factors:\n- Payee (high): Cash"
        );
    }

    #[test]
    fn test_reviewer_failure_falls_back() {
        let analyzer = HolisticAnalyzer::new(Arc::new(FailingReviewer), Duration::from_secs(1));
        let update = analyzer.analyze(&record(), &mut RngManager::new(1)).unwrap();

        let verdict = &update.verdicts[0];
        assert_eq!(verdict.verdict, FraudVerdict::Review);
        assert_eq!(verdict.confidence, 0.3);
        assert!(verdict.reasoning.contains("connection refused"));
        assert_eq!(
            update.errors,
            vec!["Holistic review error: reviewer unavailable: connection refused"]
        );
    }

    #[test]
    fn test_keyword_reviewer_clean_record() {
        let request = ReviewRequest::from_record(&record());
        let response = KeywordReviewer.review(&request).unwrap();
        // Unknown client is the only red flag
        assert_eq!(response.risk_factors.len(), 1);
        assert_eq!(response.verdict, FraudVerdict::Review);
    }
}
