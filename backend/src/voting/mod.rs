//! Weighted voting
//!
//! Combines the verdicts accumulated in an [`AnalysisRecord`](crate::models::AnalysisRecord)
//! into a single [`FinalResult`](crate::models::FinalResult):
//!
//! - per-outcome sums of `weight × confidence`, normalized by total weight
//! - an ordered decision ladder producing the final verdict and confidence
//! - a weighted average of risk ordinals
//! - a consensus signal and a prioritized recommendation list

pub mod aggregator;

pub use aggregator::{
    analysis_id, default_weights, recommendation_priority, AnalyzerWeights, Decision,
    VotingAggregator, VotingConstants, STEP_VOTING_COMPLETE, STEP_VOTING_NO_VERDICTS,
};
