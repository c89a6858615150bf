//! Analyzer stages
//!
//! Each stage reads the analysis record and returns a [`StageUpdate`] with
//! exactly one verdict. Stages never mutate the record; the runner merges
//! their updates. Resolution failures inside a stage (unknown account,
//! missing statistics) become low-confidence review verdicts; a returned
//! [`StageError`] means the stage produced nothing and the runner records it.
//!
//! Stage order:
//! 1. physical check (`check_analysis`)
//! 2. transaction history (`transaction_history`)
//! 3. policy (`policy_analysis`)
//! 4. holistic review (`holistic_review`, optional)

pub mod detectors;
pub mod history;
pub mod holistic;
pub mod physical;
pub mod policy;

pub use history::{TransactionAnalysis, TransactionHistoryAnalyzer};
pub use holistic::{
    HolisticAnalysis, HolisticAnalyzer, HolisticReviewer, KeywordReviewer, ReviewRequest,
    ReviewResponse, ReviewerError, RiskFactor,
};
pub use physical::{CheckAnalysis, PhysicalCheckAnalyzer};
pub use policy::{PolicyAnalysis, PolicyAnalyzer};

use crate::models::record::{AnalysisRecord, StageUpdate};
use crate::rng::RngManager;
use thiserror::Error;

pub const CHECK_ANALYSIS: &str = "check_analysis";
pub const TRANSACTION_HISTORY: &str = "transaction_history";
pub const POLICY_ANALYSIS: &str = "policy_analysis";
pub const HOLISTIC_REVIEW: &str = "holistic_review";

/// Failure of a stage to produce any update
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    #[error("{0}")]
    Failed(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// One analysis stage
pub trait Analyzer: Send + Sync {
    /// Stable identity; also the verdict's `analyzer` field
    fn id(&self) -> &'static str;

    /// Human-readable name used in error messages
    fn display_name(&self) -> &'static str;

    fn analyze(
        &self,
        record: &AnalysisRecord,
        rng: &mut RngManager,
    ) -> Result<StageUpdate, StageError>;
}
