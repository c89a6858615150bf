//! Check Fraud Core - Rust Engine
//!
//! Scores a check for fraud risk by running it through independent analyzers,
//! a declarative rule engine and a weighted vote.
//!
//! # Architecture
//!
//! - **core**: Analysis clock and formatting helpers
//! - **models**: Domain types (Check, Client, Verdict, AnalysisRecord, FinalResult)
//! - **repository**: Accounts, transaction history and statistics
//! - **policy**: Fraud rule engine (load, validate, evaluate)
//! - **analyzers**: Physical check, transaction history, policy and holistic stages
//! - **voting**: Weighted voting aggregator
//! - **pipeline**: Stage runner and configuration
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents); rules and analytics see dollars
//! 2. All randomness is deterministic (seeded RNG, reset per run)
//! 3. At most one verdict per analyzer per run
//! 4. Errors never escape a pipeline run

// Module declarations
pub mod analyzers;
pub mod core;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod repository;
pub mod rng;
pub mod voting;

// Re-exports for convenience
pub use analyzers::{Analyzer, HolisticReviewer, KeywordReviewer, StageError};
pub use core::AnalysisClock;
pub use models::{
    check::{Check, CheckMetadata},
    client::Client,
    event::{PipelineEvent, PipelineEventLog},
    record::{AnalysisRecord, StageUpdate},
    result::{FinalResult, VotingSummary},
    transaction::HistoricalTransaction,
    verdict::{FraudVerdict, RiskLevel, Verdict},
};
pub use pipeline::{ConfigError, Pipeline, PipelineConfig};
pub use policy::{RuleSet, RuleSetError};
pub use repository::{HistoryWindows, Repository};
pub use rng::RngManager;
pub use voting::{VotingAggregator, VotingConstants};
