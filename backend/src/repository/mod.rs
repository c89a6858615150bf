//! Client and transaction repository
//!
//! The leaf of the pipeline: account lookup, transaction history, summary
//! statistics and the sample data set used by the CLI and the tests.

pub mod sample;
pub mod stats;
pub mod store;

pub use sample::{all_sample_checks, sample_check, sample_checks, sample_clients, sample_repository, sample_transactions};
pub use stats::{population_std_dev, TransactionStatistics};
pub use store::{HistoryAnalysis, HistoryWindows, Repository};
