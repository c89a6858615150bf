//! Voting: Weighted aggregation
//!
//! Turns the record's verdicts into one decision. Each verdict votes with
//! `weight(analyzer) × confidence`; per-outcome sums are normalized by the
//! total weight and fed through an ordered decision ladder.

use crate::analyzers::{CHECK_ANALYSIS, HOLISTIC_REVIEW, POLICY_ANALYSIS, TRANSACTION_HISTORY};
use crate::core::format::format_dollars;
use crate::models::record::AnalysisRecord;
use crate::models::result::{AnalyzerVote, FinalResult, VotingSummary};
use crate::models::verdict::{clamp_confidence, FraudVerdict, RiskLevel, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Final step label after a normal vote
pub const STEP_VOTING_COMPLETE: &str = "voting_complete";

/// Final step label when no stage produced a verdict
pub const STEP_VOTING_NO_VERDICTS: &str = "voting_complete_no_verdicts";

/// Per-analyzer voting weights, keyed by analyzer id
pub type AnalyzerWeights = BTreeMap<String, f64>;

/// Default weights (the holistic reviewer sees everything, so it counts most)
pub fn default_weights() -> AnalyzerWeights {
    [
        (CHECK_ANALYSIS, 1.0),
        (TRANSACTION_HISTORY, 1.0),
        (POLICY_ANALYSIS, 1.2),
        (HOLISTIC_REVIEW, 1.5),
    ]
    .into_iter()
    .map(|(id, w)| (id.to_string(), w))
    .collect()
}

/// Tuning constants of the decision ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConstants {
    /// Weight for analyzers missing from the weight table
    pub default_weight: f64,

    /// Confidence floor when any analyzer reports fraud at critical risk
    pub critical_fraud_min_confidence: f64,

    pub fraud_threshold: f64,
    pub not_fraud_threshold: f64,
    pub review_threshold: f64,

    /// Base and slope of the fraud / not_fraud confidence ramps
    pub decisive_base_confidence: f64,
    pub decisive_slope: f64,
    pub decisive_max_confidence: f64,

    pub review_base_confidence: f64,
    pub review_slope: f64,
    pub review_max_confidence: f64,

    /// Added to the not_fraud score when nothing else matched
    pub fallback_bonus: f64,

    /// Minimum share of verdicts agreeing with the final verdict
    pub consensus_threshold: f64,

    /// Ordinal averages at which risk escalates
    pub risk_critical_at: f64,
    pub risk_high_at: f64,
    pub risk_medium_at: f64,

    pub max_recommendations: usize,
}

impl Default for VotingConstants {
    fn default() -> Self {
        Self {
            default_weight: 1.0,
            critical_fraud_min_confidence: 0.85,
            fraud_threshold: 0.5,
            not_fraud_threshold: 0.6,
            review_threshold: 0.3,
            decisive_base_confidence: 0.6,
            decisive_slope: 0.8,
            decisive_max_confidence: 0.95,
            review_base_confidence: 0.5,
            review_slope: 0.3,
            review_max_confidence: 0.85,
            fallback_bonus: 0.3,
            consensus_threshold: 0.6,
            risk_critical_at: 3.5,
            risk_high_at: 2.5,
            risk_medium_at: 1.5,
            max_recommendations: 10,
        }
    }
}

impl VotingConstants {
    /// Fields that must lie in [0, 1]
    pub fn unit_interval_fields(&self) -> [(&'static str, f64); 12] {
        [
            ("critical_fraud_min_confidence", self.critical_fraud_min_confidence),
            ("fraud_threshold", self.fraud_threshold),
            ("not_fraud_threshold", self.not_fraud_threshold),
            ("review_threshold", self.review_threshold),
            ("decisive_base_confidence", self.decisive_base_confidence),
            ("decisive_slope", self.decisive_slope),
            ("decisive_max_confidence", self.decisive_max_confidence),
            ("review_base_confidence", self.review_base_confidence),
            ("review_slope", self.review_slope),
            ("review_max_confidence", self.review_max_confidence),
            ("fallback_bonus", self.fallback_bonus),
            ("consensus_threshold", self.consensus_threshold),
        ]
    }
}

/// Recommendation keywords in priority order (lower sorts first)
const KEYWORD_PRIORITY: [(&str, u8); 7] = [
    ("REJECT", 1),
    ("ESCALATE", 2),
    ("VERIFY", 3),
    ("REVIEW", 4),
    ("FLAG", 5),
    ("REQUEST", 6),
    ("APPROVE", 7),
];

const OTHER_PRIORITY: u8 = 10;

/// Priority of a recommendation by its first matching keyword
pub fn recommendation_priority(text: &str) -> u8 {
    let upper = text.to_uppercase();
    KEYWORD_PRIORITY
        .iter()
        .find(|(keyword, _)| upper.contains(keyword))
        .map(|(_, priority)| *priority)
        .unwrap_or(OTHER_PRIORITY)
}

/// Outcome of the decision ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub verdict: FraudVerdict,
    pub confidence: f64,
}

/// Weighted voting aggregator
///
/// # Example
/// ```
/// use check_fraud_core_rs::models::{AnalysisRecord, Check};
/// use check_fraud_core_rs::voting::VotingAggregator;
/// use check_fraud_core_rs::{FraudVerdict, RiskLevel, Verdict};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let mut record = AnalysisRecord::new(Check::new("C1", "CL1", 5_000, "Payee", now), None, now);
/// record.push_verdict(Verdict::new(
///     "policy_analysis", FraudVerdict::NotFraud, 0.9, RiskLevel::Low, "clean", now,
/// ));
///
/// let result = VotingAggregator::default().aggregate(&record);
/// assert_eq!(result.final_verdict, FraudVerdict::NotFraud);
/// assert!(result.consensus_reached);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VotingAggregator {
    weights: AnalyzerWeights,
    constants: VotingConstants,
}

impl VotingAggregator {
    pub fn new(weights: AnalyzerWeights, constants: VotingConstants) -> Self {
        Self { weights, constants }
    }

    /// Aggregator with the default weight table
    pub fn with_defaults() -> Self {
        Self::new(default_weights(), VotingConstants::default())
    }

    pub fn constants(&self) -> &VotingConstants {
        &self.constants
    }

    /// Weight for an analyzer (the configured default when unlisted)
    pub fn weight(&self, analyzer: &str) -> f64 {
        self.weights
            .get(analyzer)
            .copied()
            .unwrap_or(self.constants.default_weight)
    }

    /// Produce the final result for a record
    pub fn aggregate(&self, record: &AnalysisRecord) -> FinalResult {
        let verdicts = &record.verdicts;
        let fingerprint = record
            .policy_analysis
            .as_ref()
            .map(|p| p.ruleset_fingerprint.clone());

        let (verdict, confidence, risk_level, consensus, mut summary, recommendations, final_step) =
            if verdicts.is_empty() {
                let summary = VotingSummary {
                    normalized_scores: zero_scores(),
                    weighted_scores: zero_scores(),
                    note: Some("No agent verdicts available".to_string()),
                    ..VotingSummary::default()
                };
                (
                    FraudVerdict::Review,
                    0.0,
                    RiskLevel::Medium,
                    false,
                    summary,
                    vec!["Manual review required - no automated analysis available".to_string()],
                    STEP_VOTING_NO_VERDICTS,
                )
            } else {
                let summary = self.summarize(verdicts);
                let decision = self.decide(verdicts, &summary);
                let risk = self.risk_level(verdicts);
                let consensus = self.consensus(verdicts, decision.verdict);
                let recommendations = self.consolidate_recommendations(verdicts, decision.verdict);
                (
                    decision.verdict,
                    decision.confidence,
                    risk,
                    consensus,
                    summary,
                    recommendations,
                    STEP_VOTING_COMPLETE,
                )
            };
        summary.ruleset_fingerprint = fingerprint;

        debug!(
            check_id = %record.check.check_id,
            verdict = %verdict,
            confidence,
            risk = %risk_level,
            consensus,
            "votes aggregated"
        );

        let flags: Vec<String> = record.flags.iter().cloned().collect();
        let errors = record.errors.clone();
        let notes = notes(record, verdict, confidence, risk_level, consensus, &summary, &flags);

        FinalResult {
            analysis_id: analysis_id(record),
            run_id: record.run_id.to_string(),
            check_id: record.check.check_id.clone(),
            client_id: record.check.client_id.clone(),
            verdicts: verdicts.clone(),
            final_verdict: verdict,
            final_confidence: clamp_confidence(confidence),
            final_risk_level: risk_level,
            consensus_reached: consensus,
            voting_summary: summary,
            analysis_timestamp: record.as_of,
            processing_time_seconds: record.started.elapsed().as_secs_f64(),
            notes,
            flags,
            findings: record.findings.iter().cloned().collect(),
            recommendations,
            errors,
            final_step: final_step.to_string(),
            events: record.events.clone(),
        }
    }

    /// Vote counts, weighted and normalized scores
    pub fn summarize(&self, verdicts: &[Verdict]) -> VotingSummary {
        let mut vote_counts = BTreeMap::new();
        let mut weighted_scores = zero_scores();
        let mut analyzer_votes = BTreeMap::new();
        let mut total_weight = 0.0;

        for v in verdicts {
            let weight = self.weight(&v.analyzer);
            let weighted_score = weight * v.confidence;

            *vote_counts.entry(v.verdict).or_insert(0) += 1;
            // Unknown verdicts are counted but carry no weight
            if let Some(score) = weighted_scores.get_mut(&v.verdict) {
                *score += weighted_score;
                total_weight += weighted_score;
            }

            analyzer_votes.insert(
                v.analyzer.clone(),
                AnalyzerVote {
                    verdict: v.verdict,
                    confidence: v.confidence,
                    risk_level: v.risk_level,
                    weight,
                    weighted_score,
                },
            );
        }

        let normalized_scores = weighted_scores
            .iter()
            .map(|(verdict, score)| {
                let normalized = if total_weight > 0.0 { score / total_weight } else { 0.0 };
                (*verdict, normalized)
            })
            .collect();

        let weighted_verdict = if total_weight > 0.0 {
            // First maximum in voting order
            FraudVerdict::VOTING.iter().copied().fold(None, |best: Option<FraudVerdict>, v| {
                match best {
                    Some(b) if weighted_scores[&b] >= weighted_scores[&v] => Some(b),
                    _ => Some(v),
                }
            })
        } else {
            None
        };

        VotingSummary {
            total_analyzers: verdicts.len(),
            majority_verdict: majority(verdicts),
            weighted_verdict,
            vote_counts,
            weighted_scores,
            normalized_scores,
            analyzer_votes,
            total_weight,
            note: None,
            ruleset_fingerprint: None,
        }
    }

    /// Apply the decision ladder to normalized scores
    pub fn decide(&self, verdicts: &[Verdict], summary: &VotingSummary) -> Decision {
        let c = &self.constants;
        let fraud = summary.normalized(FraudVerdict::Fraud);
        let not_fraud = summary.normalized(FraudVerdict::NotFraud);
        let review = summary.normalized(FraudVerdict::Review);

        let critical_fraud = verdicts
            .iter()
            .any(|v| v.verdict == FraudVerdict::Fraud && v.risk_level == RiskLevel::Critical);

        let (verdict, confidence) = if critical_fraud {
            (FraudVerdict::Fraud, fraud.max(c.critical_fraud_min_confidence))
        } else if fraud > c.fraud_threshold {
            (
                FraudVerdict::Fraud,
                (c.decisive_base_confidence + c.decisive_slope * (fraud - c.fraud_threshold))
                    .min(c.decisive_max_confidence),
            )
        } else if not_fraud > c.not_fraud_threshold {
            (
                FraudVerdict::NotFraud,
                (c.decisive_base_confidence
                    + c.decisive_slope * (not_fraud - c.not_fraud_threshold))
                    .min(c.decisive_max_confidence),
            )
        } else if fraud > c.review_threshold || review > c.review_threshold {
            (
                FraudVerdict::Review,
                (c.review_base_confidence + c.review_slope * review).min(c.review_max_confidence),
            )
        } else {
            (FraudVerdict::NotFraud, not_fraud + c.fallback_bonus)
        };

        Decision {
            verdict,
            confidence: clamp_confidence(confidence),
        }
    }

    /// Weighted average of risk ordinals
    pub fn risk_level(&self, verdicts: &[Verdict]) -> RiskLevel {
        if verdicts.iter().any(|v| v.risk_level == RiskLevel::Critical) {
            return RiskLevel::Critical;
        }

        let (weighted, total) = verdicts.iter().fold((0.0, 0.0), |(sum, total), v| {
            let w = self.weight(&v.analyzer) * v.confidence;
            (sum + w * f64::from(v.risk_level.ordinal()), total + w)
        });
        let average = if total > 0.0 { weighted / total } else { 2.0 };

        let c = &self.constants;
        if average >= c.risk_critical_at {
            RiskLevel::Critical
        } else if average >= c.risk_high_at {
            RiskLevel::High
        } else if average >= c.risk_medium_at {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Whether enough verdicts agree with the final verdict
    pub fn consensus(&self, verdicts: &[Verdict], final_verdict: FraudVerdict) -> bool {
        if verdicts.len() < 2 {
            return true;
        }
        let agreeing = verdicts.iter().filter(|v| v.verdict == final_verdict).count();
        agreeing as f64 / verdicts.len() as f64 >= self.constants.consensus_threshold
    }

    /// Union of verdict recommendations, prioritized and capped
    pub fn consolidate_recommendations(
        &self,
        verdicts: &[Verdict],
        final_verdict: FraudVerdict,
    ) -> Vec<String> {
        let mut recommendations: Vec<String> = Vec::new();
        for rec in verdicts.iter().flat_map(|v| v.recommendations.iter()) {
            if !recommendations.contains(rec) {
                recommendations.push(rec.clone());
            }
        }

        // Stable: equal priorities keep verdict order
        recommendations.sort_by_key(|r| recommendation_priority(r));

        let mentions = |keywords: &[&str]| {
            recommendations.iter().any(|r| {
                let upper = r.to_uppercase();
                keywords.iter().any(|k| upper.contains(k))
            })
        };

        match final_verdict {
            FraudVerdict::Fraud if !mentions(&["REJECT"]) => {
                recommendations.insert(0, "REJECT: Multiple fraud indicators detected".to_string())
            }
            FraudVerdict::Review if !mentions(&["REVIEW", "ESCALATE"]) => recommendations.insert(
                0,
                "REVIEW: Manual verification required before processing".to_string(),
            ),
            _ => {}
        }

        recommendations.truncate(self.constants.max_recommendations);
        recommendations
    }
}

fn zero_scores() -> BTreeMap<FraudVerdict, f64> {
    FraudVerdict::VOTING.iter().map(|v| (*v, 0.0)).collect()
}

/// Most common outcome; ties go to the one seen first
fn majority(verdicts: &[Verdict]) -> Option<FraudVerdict> {
    let mut counts: Vec<(FraudVerdict, usize)> = Vec::new();
    for v in verdicts {
        match counts.iter_mut().find(|(seen, _)| *seen == v.verdict) {
            Some((_, n)) => *n += 1,
            None => counts.push((v.verdict, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(FraudVerdict, usize)>, (v, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((v, n)),
        })
        .map(|(v, _)| v)
}

/// `ANALYSIS_<check_id>_<YYYYmmddHHMMSS>`
pub fn analysis_id(record: &AnalysisRecord) -> String {
    format!(
        "ANALYSIS_{}_{}",
        record.check.check_id,
        record.as_of.format("%Y%m%d%H%M%S")
    )
}

fn notes(
    record: &AnalysisRecord,
    verdict: FraudVerdict,
    confidence: f64,
    risk_level: RiskLevel,
    consensus: bool,
    summary: &VotingSummary,
    flags: &[String],
) -> String {
    let check = &record.check;
    let mut parts = vec![
        "Fraud Analysis Summary".to_string(),
        "=".repeat(40),
        format!(
            "\nCheck: {} - ${}",
            check.check_id,
            format_dollars(check.amount_dollars())
        ),
        format!("Payee: {}", check.payee),
        format!("\nFinal Verdict: {}", verdict),
        format!("Confidence: {:.1}%", confidence * 100.0),
        format!("Risk Level: {}", risk_level),
        format!("Consensus: {}", if consensus { "Yes" } else { "No" }),
    ];

    if !summary.vote_counts.is_empty() {
        let counts: Vec<String> = summary
            .vote_counts
            .iter()
            .map(|(v, n)| format!("{}: {}", v, n))
            .collect();
        parts.push(format!("\nVoting: {}", counts.join(", ")));
    }

    if !flags.is_empty() {
        parts.push(format!("\nFlags Raised: {}", flags.len()));
        parts.extend(flags.iter().take(5).map(|f| format!("  - {}", f)));
    }

    if !record.errors.is_empty() {
        parts.push(format!("\nProcessing Errors: {}", record.errors.len()));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check::Check;
    use chrono::{TimeZone, Utc};

    fn record_with(verdicts: Vec<(&str, FraudVerdict, f64, RiskLevel)>) -> AnalysisRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let mut record =
            AnalysisRecord::new(Check::new("CHK001", "CL1", 123_456, "Acme", at), None, at);
        for (analyzer, verdict, confidence, risk) in verdicts {
            record.push_verdict(
                Verdict::new(analyzer, verdict, confidence, risk, "", at)
                    .with_recommendations(vec![format!("note from {}", analyzer)]),
            );
        }
        record
    }

    #[test]
    fn test_empty_record_is_degenerate() {
        let result = VotingAggregator::with_defaults().aggregate(&record_with(vec![]));
        assert_eq!(result.final_verdict, FraudVerdict::Review);
        assert_eq!(result.final_confidence, 0.0);
        assert_eq!(result.final_risk_level, RiskLevel::Medium);
        assert!(!result.consensus_reached);
        assert_eq!(result.final_step, STEP_VOTING_NO_VERDICTS);
        assert_eq!(
            result.voting_summary.note.as_deref(),
            Some("No agent verdicts available")
        );
        assert_eq!(result.voting_summary.normalized_scores.len(), 3);
    }

    #[test]
    fn test_critical_fraud_dominates() {
        let record = record_with(vec![
            (CHECK_ANALYSIS, FraudVerdict::Fraud, 0.95, RiskLevel::Critical),
            (TRANSACTION_HISTORY, FraudVerdict::NotFraud, 0.9, RiskLevel::Low),
            (POLICY_ANALYSIS, FraudVerdict::NotFraud, 0.85, RiskLevel::Low),
        ]);
        let result = VotingAggregator::with_defaults().aggregate(&record);
        assert_eq!(result.final_verdict, FraudVerdict::Fraud);
        assert_eq!(result.final_confidence, 0.85);
        assert_eq!(result.final_risk_level, RiskLevel::Critical);
        assert!(!result.consensus_reached);
        assert_eq!(result.recommendations[0], "REJECT: Multiple fraud indicators detected");
    }

    #[test]
    fn test_review_prefix_added() {
        let record = record_with(vec![(
            CHECK_ANALYSIS,
            FraudVerdict::Review,
            0.7,
            RiskLevel::High,
        )]);
        let result = VotingAggregator::with_defaults().aggregate(&record);
        assert_eq!(result.final_verdict, FraudVerdict::Review);
        assert!((result.final_confidence - 0.8).abs() < 1e-9);
        assert_eq!(
            result.recommendations[0],
            "REVIEW: Manual verification required before processing"
        );
    }

    #[test]
    fn test_recommendations_sorted_by_keyword() {
        let at = Utc::now();
        let verdicts = vec![Verdict::new(CHECK_ANALYSIS, FraudVerdict::Fraud, 0.9, RiskLevel::High, "", at)
            .with_recommendations(vec![
                "APPROVE: fine".to_string(),
                "Call the customer".to_string(),
                "VERIFY: account".to_string(),
                "REJECT: counterfeit".to_string(),
            ])];
        let recs = VotingAggregator::with_defaults()
            .consolidate_recommendations(&verdicts, FraudVerdict::Fraud);
        assert_eq!(
            recs,
            vec!["REJECT: counterfeit", "VERIFY: account", "APPROVE: fine", "Call the customer"]
        );
    }

    #[test]
    fn test_majority_tie_goes_to_first_seen() {
        let record = record_with(vec![
            (CHECK_ANALYSIS, FraudVerdict::Review, 0.5, RiskLevel::Medium),
            (POLICY_ANALYSIS, FraudVerdict::NotFraud, 0.5, RiskLevel::Low),
        ]);
        let summary = VotingAggregator::with_defaults().summarize(&record.verdicts);
        assert_eq!(summary.majority_verdict, Some(FraudVerdict::Review));
        assert_eq!(summary.weighted_verdict, Some(FraudVerdict::NotFraud));
    }

    #[test]
    fn test_unknown_verdict_carries_no_weight() {
        let record = record_with(vec![
            (CHECK_ANALYSIS, FraudVerdict::NotFraud, 0.5, RiskLevel::Low),
            ("mystery", FraudVerdict::Unknown, 0.5, RiskLevel::Low),
        ]);
        let summary = VotingAggregator::with_defaults().summarize(&record.verdicts);
        assert!((summary.normalized(FraudVerdict::NotFraud) - 1.0).abs() < 1e-9);
        assert_eq!(summary.total_weight, 0.5);
        assert_eq!(summary.vote_counts[&FraudVerdict::Unknown], 1);
        let sum: f64 = summary.normalized_scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_unknown_verdicts_leave_zero_weight() {
        let record = record_with(vec![("mystery", FraudVerdict::Unknown, 0.9, RiskLevel::High)]);
        let summary = VotingAggregator::with_defaults().summarize(&record.verdicts);
        assert_eq!(summary.total_weight, 0.0);
        assert_eq!(summary.weighted_verdict, None);
        assert!(summary.normalized_scores.values().all(|s| *s == 0.0));
    }

    #[test]
    fn test_analysis_id_and_notes() {
        let record = record_with(vec![(
            POLICY_ANALYSIS,
            FraudVerdict::NotFraud,
            0.85,
            RiskLevel::Low,
        )]);
        let result = VotingAggregator::with_defaults().aggregate(&record);
        assert_eq!(result.analysis_id, "ANALYSIS_CHK001_20240305143000");
        assert!(result.notes.starts_with("Fraud Analysis Summary\n"));
        assert!(result.notes.contains("Check: CHK001 - $1,234.56"));
        assert!(result.notes.contains("Consensus: Yes"));
    }
}
