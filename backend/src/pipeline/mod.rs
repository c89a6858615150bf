//! Decision pipeline
//!
//! [`Pipeline`] threads an analysis record through the analyzer stages and
//! the voting aggregator. [`PipelineConfig`] carries every tunable.

pub mod config;
pub mod runner;

pub use config::{ConfigError, PipelineConfig};
pub use runner::Pipeline;
