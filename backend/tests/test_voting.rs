// Voting aggregator tests
//
// Hand-computed ladders: every expected number below can be reproduced
// with a pencil from weight × confidence.

use check_fraud_core_rs::models::{AnalysisRecord, Check, Verdict};
use check_fraud_core_rs::voting::{
    default_weights, recommendation_priority, VotingAggregator, VotingConstants,
    STEP_VOTING_COMPLETE, STEP_VOTING_NO_VERDICTS,
};
use check_fraud_core_rs::{FraudVerdict, RiskLevel};
use chrono::{DateTime, TimeZone, Utc};

const EPS: f64 = 1e-9;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn record_with(verdicts: Vec<Verdict>) -> AnalysisRecord {
    let mut record = AnalysisRecord::new(Check::new("CHK9", "CL9", 25_000, "Payee", at()), None, at());
    for v in verdicts {
        record.push_verdict(v);
    }
    record
}

fn vote(analyzer: &str, verdict: FraudVerdict, confidence: f64, risk: RiskLevel) -> Verdict {
    Verdict::new(analyzer, verdict, confidence, risk, "", at())
}

fn mixed_votes() -> Vec<Verdict> {
    vec![
        vote("check_analysis", FraudVerdict::Fraud, 0.9, RiskLevel::High),
        vote("transaction_history", FraudVerdict::NotFraud, 0.85, RiskLevel::Low),
        vote("policy_analysis", FraudVerdict::Review, 0.6, RiskLevel::Medium),
    ]
}

// ============================================================================
// Empty and mixed inputs
// ============================================================================

#[test]
fn test_no_verdicts_means_review_zero_confidence() {
    let result = VotingAggregator::with_defaults().aggregate(&record_with(Vec::new()));

    assert_eq!(result.final_verdict, FraudVerdict::Review);
    assert_eq!(result.final_confidence, 0.0);
    assert_eq!(result.final_risk_level, RiskLevel::Medium);
    assert!(!result.consensus_reached);
    assert_eq!(result.final_step, STEP_VOTING_NO_VERDICTS);
    assert_eq!(
        result.voting_summary.note.as_deref(),
        Some("No agent verdicts available")
    );
    assert_eq!(
        result.recommendations,
        vec!["Manual review required - no automated analysis available".to_string()]
    );
}

#[test]
fn test_mixed_votes_normalized_scores() {
    let aggregator = VotingAggregator::with_defaults();
    let summary = aggregator.summarize(&mixed_votes());

    // fraud 0.9, not_fraud 0.85, review 1.2 × 0.6 = 0.72; total 2.47
    assert!((summary.total_weight - 2.47).abs() < EPS);
    assert!((summary.weighted_scores[&FraudVerdict::Review] - 0.72).abs() < EPS);
    assert!((summary.normalized(FraudVerdict::Fraud) - 0.9 / 2.47).abs() < EPS);
    assert!((summary.normalized(FraudVerdict::NotFraud) - 0.85 / 2.47).abs() < EPS);
    assert!((summary.normalized(FraudVerdict::Review) - 0.72 / 2.47).abs() < EPS);

    assert_eq!(summary.weighted_verdict, Some(FraudVerdict::Fraud));
    // One vote each: first seen wins the tie
    assert_eq!(summary.majority_verdict, Some(FraudVerdict::Fraud));
    assert_eq!(summary.analyzer_votes["policy_analysis"].weight, 1.2);
}

#[test]
fn test_mixed_votes_final_decision() {
    let result = VotingAggregator::with_defaults().aggregate(&record_with(mixed_votes()));

    // fraud 0.364 ≤ 0.5, not_fraud 0.344 ≤ 0.6, fraud > 0.3 → review
    assert_eq!(result.final_verdict, FraudVerdict::Review);
    let review = 0.72 / 2.47;
    assert!((result.final_confidence - (0.5 + 0.3 * review)).abs() < EPS);

    // (0.9·3 + 0.85·1 + 0.72·2) / 2.47 ≈ 2.02 → medium
    assert_eq!(result.final_risk_level, RiskLevel::Medium);

    // 1 of 3 agree
    assert!(!result.consensus_reached);
    assert_eq!(result.final_step, STEP_VOTING_COMPLETE);
    assert_eq!(result.recommendations[0], "REVIEW: Manual verification required before processing");
}

#[test]
fn test_mixed_votes_are_deterministic() {
    let aggregator = VotingAggregator::with_defaults();
    let a = aggregator.aggregate(&record_with(mixed_votes()));
    let b = aggregator.aggregate(&record_with(mixed_votes()));

    assert_eq!(a.final_verdict, b.final_verdict);
    assert_eq!(a.final_confidence, b.final_confidence);
    assert_eq!(a.voting_summary.normalized_scores, b.voting_summary.normalized_scores);
    assert_eq!(a.analysis_id, "ANALYSIS_CHK9_20240601120000");
}

// ============================================================================
// Decision ladder
// ============================================================================

#[test]
fn test_critical_fraud_verdict_dominates() {
    let votes = vec![
        vote("check_analysis", FraudVerdict::Fraud, 0.4, RiskLevel::Critical),
        vote("transaction_history", FraudVerdict::NotFraud, 0.9, RiskLevel::Low),
        vote("policy_analysis", FraudVerdict::NotFraud, 0.9, RiskLevel::Low),
    ];
    let result = VotingAggregator::with_defaults().aggregate(&record_with(votes));

    assert_eq!(result.final_verdict, FraudVerdict::Fraud);
    assert_eq!(result.final_confidence, 0.85);
    assert_eq!(result.final_risk_level, RiskLevel::Critical);
    assert_eq!(result.recommendations[0], "REJECT: Multiple fraud indicators detected");
}

#[test]
fn test_decisive_fraud_confidence_capped() {
    let votes = vec![
        vote("check_analysis", FraudVerdict::Fraud, 0.95, RiskLevel::High),
        vote("policy_analysis", FraudVerdict::Fraud, 0.95, RiskLevel::High),
    ];
    let result = VotingAggregator::with_defaults().aggregate(&record_with(votes));

    // normalized fraud 1.0 → 0.6 + 0.8 × 0.5 = 1.0, capped at 0.95
    assert_eq!(result.final_verdict, FraudVerdict::Fraud);
    assert!((result.final_confidence - 0.95).abs() < EPS);
    assert!(result.consensus_reached);
    assert_eq!(result.final_risk_level, RiskLevel::High);
}

#[test]
fn test_unanimous_not_fraud() {
    let votes = vec![
        vote("check_analysis", FraudVerdict::NotFraud, 0.9, RiskLevel::Low),
        vote("transaction_history", FraudVerdict::NotFraud, 0.8, RiskLevel::Low),
        vote("policy_analysis", FraudVerdict::NotFraud, 0.85, RiskLevel::Low),
    ];
    let result = VotingAggregator::with_defaults().aggregate(&record_with(votes));

    assert_eq!(result.final_verdict, FraudVerdict::NotFraud);
    assert!((result.final_confidence - 0.92).abs() < EPS);
    assert_eq!(result.final_risk_level, RiskLevel::Low);
    assert!(result.consensus_reached);
}

#[test]
fn test_zero_confidence_votes_fall_through() {
    let votes = vec![
        vote("check_analysis", FraudVerdict::Fraud, 0.0, RiskLevel::Low),
        vote("policy_analysis", FraudVerdict::NotFraud, 0.0, RiskLevel::Low),
    ];
    let aggregator = VotingAggregator::with_defaults();
    let summary = aggregator.summarize(&votes);
    assert_eq!(summary.total_weight, 0.0);
    assert_eq!(summary.weighted_verdict, None);

    let decision = aggregator.decide(&votes, &summary);
    assert_eq!(decision.verdict, FraudVerdict::NotFraud);
    assert!((decision.confidence - 0.3).abs() < EPS);
}

#[test]
fn test_unknown_analyzer_gets_default_weight() {
    let aggregator = VotingAggregator::with_defaults();
    assert_eq!(aggregator.weight("holistic_review"), 1.5);
    assert_eq!(aggregator.weight("some_new_stage"), 1.0);
    assert_eq!(default_weights().len(), 4);
}

#[test]
fn test_custom_thresholds() {
    let constants = VotingConstants {
        review_threshold: 0.9,
        ..VotingConstants::default()
    };
    let aggregator = VotingAggregator::new(default_weights(), constants);
    let summary = aggregator.summarize(&mixed_votes());

    // Nothing clears the raised review bar: not_fraud + bonus
    let decision = aggregator.decide(&mixed_votes(), &summary);
    assert_eq!(decision.verdict, FraudVerdict::NotFraud);
    assert!((decision.confidence - (0.85 / 2.47 + 0.3)).abs() < EPS);
}

// ============================================================================
// Recommendations
// ============================================================================

#[test]
fn test_recommendation_priority_keywords() {
    assert_eq!(recommendation_priority("REJECT per policy POL003"), 1);
    assert_eq!(recommendation_priority("Escalate to fraud team"), 2);
    assert_eq!(recommendation_priority("Verify payee identity"), 3);
    assert_eq!(recommendation_priority("REVIEW per policy POL006"), 4);
    assert_eq!(recommendation_priority("FLAG as suspicious per POL002"), 5);
    assert_eq!(recommendation_priority("Request higher quality image"), 6);
    assert_eq!(recommendation_priority("Approve - compliant"), 7);
    assert_eq!(recommendation_priority("Call the customer"), 10);
}

#[test]
fn test_recommendations_sorted_deduped_and_capped() {
    let mut first = vote("check_analysis", FraudVerdict::NotFraud, 0.9, RiskLevel::Low);
    first.recommendations = (0..8).map(|i| format!("Call branch {}", i)).collect();
    first.recommendations.push("Approve deposit".to_string());

    let mut second = vote("policy_analysis", FraudVerdict::NotFraud, 0.9, RiskLevel::Low);
    second.recommendations = vec![
        "Verify payee identity".to_string(),
        "Call branch 0".to_string(),
        "Escalate to compliance".to_string(),
    ];

    let recs = VotingAggregator::with_defaults()
        .consolidate_recommendations(&[first, second], FraudVerdict::NotFraud);

    assert_eq!(recs.len(), 10);
    assert_eq!(recs[0], "Escalate to compliance");
    assert_eq!(recs[1], "Verify payee identity");
    assert_eq!(recs[2], "Approve deposit");
    assert_eq!(recs.iter().filter(|r| *r == "Call branch 0").count(), 1);
}

#[test]
fn test_fraud_recommendation_not_duplicated_when_reject_present() {
    let mut v = vote("policy_analysis", FraudVerdict::Fraud, 0.95, RiskLevel::Critical);
    v.recommendations = vec!["REJECT per policy POL003: Unsigned check".to_string()];

    let recs = VotingAggregator::with_defaults().consolidate_recommendations(&[v], FraudVerdict::Fraud);
    assert_eq!(recs, vec!["REJECT per policy POL003: Unsigned check".to_string()]);
}

// ============================================================================
// Notes
// ============================================================================

#[test]
fn test_notes_summarize_vote() {
    let mut record = record_with(mixed_votes());
    record.flags.insert("missing_watermark".to_string());
    record.errors.push("Holistic review error: reviewer timed out after 20ms".to_string());

    let result = VotingAggregator::with_defaults().aggregate(&record);
    assert!(result.notes.contains("Check: CHK9 - $250.00"));
    assert!(result.notes.contains("missing_watermark"));
    assert!(result.notes.contains("Processing Errors"));
    assert_eq!(result.flags, vec!["missing_watermark".to_string()]);
}
