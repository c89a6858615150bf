//! Clock and shared primitives
//!
//! All date arithmetic in the pipeline goes through [`AnalysisClock`] so that
//! account age and history windows are reproducible in tests.

pub mod clock;
pub mod format;

pub use clock::AnalysisClock;
pub use format::{format_dollars, percent};
