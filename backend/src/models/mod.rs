//! Domain models for the check fraud pipeline

pub mod check;
pub mod client;
pub mod event;
pub mod record;
pub mod result;
pub mod transaction;
pub mod verdict;

// Re-exports
pub use check::{Check, CheckMetadata};
pub use client::Client;
pub use event::{PipelineEvent, PipelineEventLog};
pub use record::{AnalysisRecord, StageOutput, StageUpdate, STEP_INITIALIZED};
pub use result::{AnalyzerVote, FinalResult, VotingSummary};
pub use transaction::HistoricalTransaction;
pub use verdict::{clamp_confidence, FraudVerdict, RiskLevel, Verdict};
