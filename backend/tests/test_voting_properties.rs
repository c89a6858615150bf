// Property tests for the voting aggregator
//
// Random verdict sets drawn from the four analyzer ids; checks the
// arithmetic guarantees that hold for any input.

use check_fraud_core_rs::models::{AnalysisRecord, Check, Verdict};
use check_fraud_core_rs::voting::VotingAggregator;
use check_fraud_core_rs::{FraudVerdict, RiskLevel};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

const ANALYZERS: [&str; 4] = [
    "check_analysis",
    "transaction_history",
    "policy_analysis",
    "holistic_review",
];

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn outcome() -> impl Strategy<Value = FraudVerdict> {
    prop_oneof![
        Just(FraudVerdict::Fraud),
        Just(FraudVerdict::NotFraud),
        Just(FraudVerdict::Review),
        Just(FraudVerdict::Unknown),
    ]
}

fn risk() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Low),
        Just(RiskLevel::Medium),
        Just(RiskLevel::High),
        Just(RiskLevel::Critical),
    ]
}

/// Zero to four verdicts, at most one per analyzer
fn verdicts() -> impl Strategy<Value = Vec<Verdict>> {
    prop::collection::vec((outcome(), 0.0..=1.0f64, risk()), 0..=4).prop_map(|votes| {
        votes
            .into_iter()
            .zip(ANALYZERS)
            .map(|((verdict, confidence, risk), analyzer)| {
                Verdict::new(analyzer, verdict, confidence, risk, "", at())
            })
            .collect()
    })
}

fn record_with(verdicts: &[Verdict]) -> AnalysisRecord {
    let mut record = AnalysisRecord::new(Check::new("P1", "CL1", 10_000, "Payee", at()), None, at());
    for v in verdicts {
        record.push_verdict(v.clone());
    }
    record
}

proptest! {
    #[test]
    fn normalized_scores_sum_to_one_or_zero(votes in verdicts()) {
        let summary = VotingAggregator::with_defaults().summarize(&votes);
        let sum: f64 = summary.normalized_scores.values().sum();

        if summary.total_weight > 0.0 {
            prop_assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
        } else {
            prop_assert_eq!(sum, 0.0);
            prop_assert_eq!(summary.weighted_verdict, None);
        }
        for score in summary.normalized_scores.values() {
            prop_assert!((0.0..=1.0 + 1e-12).contains(score));
        }
    }

    #[test]
    fn final_confidence_in_unit_interval(votes in verdicts()) {
        let result = VotingAggregator::with_defaults().aggregate(&record_with(&votes));
        prop_assert!((0.0..=1.0).contains(&result.final_confidence));
        prop_assert!(result.recommendations.len() <= 10);
        prop_assert_eq!(result.verdicts.len(), votes.len());
    }

    #[test]
    fn consensus_with_a_single_verdict(
        verdict in outcome(),
        confidence in 0.0..=1.0f64,
        level in risk(),
    ) {
        let votes = vec![Verdict::new("policy_analysis", verdict, confidence, level, "", at())];
        let result = VotingAggregator::with_defaults().aggregate(&record_with(&votes));
        prop_assert!(result.consensus_reached);
    }

    #[test]
    fn critical_fraud_always_wins(votes in verdicts(), confidence in 0.0..=1.0f64) {
        let mut votes = votes;
        votes.truncate(3);
        votes.push(Verdict::new(
            "holistic_review",
            FraudVerdict::Fraud,
            confidence,
            RiskLevel::Critical,
            "",
            at(),
        ));
        let result = VotingAggregator::with_defaults().aggregate(&record_with(&votes));

        prop_assert_eq!(result.final_verdict, FraudVerdict::Fraud);
        prop_assert!(result.final_confidence >= 0.85);
        prop_assert_eq!(result.final_risk_level, RiskLevel::Critical);
    }

    #[test]
    fn more_fraud_confidence_never_lowers_fraud_score(
        votes in verdicts(),
        low in 0.0..=0.5f64,
        bump in 0.0..=0.5f64,
    ) {
        let mut votes = votes;
        votes.truncate(3);
        let aggregator = VotingAggregator::with_defaults();

        let with = |confidence: f64| {
            let mut all = votes.clone();
            all.push(Verdict::new("holistic_review", FraudVerdict::Fraud, confidence, RiskLevel::High, "", at()));
            aggregator.summarize(&all).normalized(FraudVerdict::Fraud)
        };

        prop_assert!(with(low + bump) + 1e-12 >= with(low));
    }

    #[test]
    fn aggregation_is_deterministic(votes in verdicts()) {
        let aggregator = VotingAggregator::with_defaults();
        let a = aggregator.aggregate(&record_with(&votes));
        let b = aggregator.aggregate(&record_with(&votes));
        prop_assert_eq!(a.final_verdict, b.final_verdict);
        prop_assert_eq!(a.final_confidence, b.final_confidence);
        prop_assert_eq!(a.final_risk_level, b.final_risk_level);
        prop_assert_eq!(a.recommendations, b.recommendations);
    }
}
