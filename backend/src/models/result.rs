//! Final result of a pipeline run
//!
//! Immutable snapshot produced by the voting aggregator. Serializes to JSON.

use crate::models::event::PipelineEventLog;
use crate::models::verdict::{FraudVerdict, RiskLevel, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One analyzer's contribution to the vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerVote {
    pub verdict: FraudVerdict,
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub weight: f64,

    /// `weight × confidence`
    pub weighted_score: f64,
}

/// How the final verdict was reached
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotingSummary {
    pub total_analyzers: usize,
    pub vote_counts: BTreeMap<FraudVerdict, usize>,
    pub weighted_scores: BTreeMap<FraudVerdict, f64>,
    pub normalized_scores: BTreeMap<FraudVerdict, f64>,
    pub analyzer_votes: BTreeMap<String, AnalyzerVote>,
    pub total_weight: f64,
    pub majority_verdict: Option<FraudVerdict>,
    pub weighted_verdict: Option<FraudVerdict>,

    /// Set when aggregation had nothing to vote on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// SHA-256 of the rule set the policy stage evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ruleset_fingerprint: Option<String>,
}

impl VotingSummary {
    /// Normalized score for an outcome (0 when absent)
    pub fn normalized(&self, verdict: FraudVerdict) -> f64 {
        self.normalized_scores.get(&verdict).copied().unwrap_or(0.0)
    }
}

/// Complete fraud analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub analysis_id: String,
    pub run_id: String,
    pub check_id: String,
    pub client_id: String,
    pub verdicts: Vec<Verdict>,
    pub final_verdict: FraudVerdict,
    pub final_confidence: f64,
    pub final_risk_level: RiskLevel,
    pub consensus_reached: bool,
    pub voting_summary: VotingSummary,
    pub analysis_timestamp: DateTime<Utc>,
    pub processing_time_seconds: f64,
    pub notes: String,
    pub flags: Vec<String>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub errors: Vec<String>,
    pub final_step: String,
    pub events: PipelineEventLog,
}

impl FinalResult {
    /// Verdict contributed by a given analyzer
    pub fn verdict_from(&self, analyzer: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.analyzer == analyzer)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
