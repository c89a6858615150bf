//! Document detectors
//!
//! Simulated physical-document checks consumed by the physical-check
//! analyzer. Each detector turns the check's flags and capture metadata into
//! a typed result plus a [`RiskAssessment`]. Confidence bands that vary in
//! practice are drawn from the injected [`RngManager`](crate::RngManager);
//! MICR validation is pure.

pub mod image_quality;
pub mod micr;
pub mod signature;
pub mod watermark;

pub use image_quality::{ImageQualityDetector, ImageQualityResult, ManipulationResult};
pub use micr::{is_valid_routing_number, MicrResult, MicrValidator};
pub use signature::{ForgeryScan, SignatureDetector, SignatureResult};
pub use watermark::{WatermarkDetector, WatermarkResult};

use crate::models::verdict::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a detector recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Approve,
    FlagForReview,
    ManualReview,
    Reject,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Approve => "approve",
            RecommendedAction::FlagForReview => "flag_for_review",
            RecommendedAction::ManualReview => "manual_review",
            RecommendedAction::Reject => "reject",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk summary of one detector result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub recommendation: RecommendedAction,
    pub reason: String,
}

impl RiskAssessment {
    pub fn new(
        risk_level: RiskLevel,
        risk_score: f64,
        recommendation: RecommendedAction,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            risk_level,
            risk_score,
            recommendation,
            reason: reason.into(),
        }
    }
}
