//! Verdict model
//!
//! One analyzer's opinion about a check. Outcomes and risk levels are closed
//! enumerations; confidence is clamped to [0, 1] when a verdict is built, so
//! downstream arithmetic never sees an out-of-range value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudVerdict {
    Fraud,
    NotFraud,
    Review,
    Unknown,
}

impl FraudVerdict {
    /// Outcomes that carry voting weight
    pub const VOTING: [FraudVerdict; 3] =
        [FraudVerdict::Fraud, FraudVerdict::NotFraud, FraudVerdict::Review];

    pub fn as_str(&self) -> &'static str {
        match self {
            FraudVerdict::Fraud => "fraud",
            FraudVerdict::NotFraud => "not_fraud",
            FraudVerdict::Review => "review",
            FraudVerdict::Unknown => "unknown",
        }
    }

    /// Lenient parse; anything unrecognised is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fraud" => Some(FraudVerdict::Fraud),
            "not_fraud" => Some(FraudVerdict::NotFraud),
            "review" => Some(FraudVerdict::Review),
            "unknown" => Some(FraudVerdict::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for FraudVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Risk classification, also used as rule severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Ordinal used by risk averaging (low 1 .. critical 4)
    pub fn ordinal(&self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single analyzer's verdict
///
/// # Example
/// ```
/// use check_fraud_core_rs::{FraudVerdict, RiskLevel, Verdict};
/// use chrono::Utc;
///
/// let v = Verdict::new("policy_analysis", FraudVerdict::Fraud, 1.4, RiskLevel::High, "", Utc::now());
/// assert_eq!(v.confidence, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Identity of the producing analyzer
    pub analyzer: String,
    pub verdict: FraudVerdict,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub reasoning: String,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Verdict {
    pub fn new(
        analyzer: impl Into<String>,
        verdict: FraudVerdict,
        confidence: f64,
        risk_level: RiskLevel,
        reasoning: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            analyzer: analyzer.into(),
            verdict,
            confidence: clamp_confidence(confidence),
            risk_level,
            reasoning: reasoning.into(),
            findings: Vec::new(),
            recommendations: Vec::new(),
            timestamp,
        }
    }

    pub fn with_findings(mut self, findings: Vec<String>) -> Self {
        self.findings = findings;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }
}

/// Clamp to [0, 1]; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
