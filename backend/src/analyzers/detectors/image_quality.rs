//! Detectors: Image quality and manipulation
//!
//! Scores the captured image from the supplied quality score, or estimates
//! one from the deposit channel and device when none was supplied. The
//! manipulation scan looks for signs the image was edited.

use crate::analyzers::detectors::{RecommendedAction, RiskAssessment};
use crate::models::check::{Check, CheckMetadata};
use crate::models::verdict::RiskLevel;
use serde::{Deserialize, Serialize};

/// Below this score verification is unreliable
pub const MINIMUM_QUALITY_SCORE: f64 = 0.6;

pub const OPTIMAL_QUALITY_SCORE: f64 = 0.85;

/// Outcome of image quality analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQualityResult {
    pub overall_score: f64,
    pub resolution_adequate: bool,
    pub brightness_score: f64,
    pub contrast_score: f64,
    pub sharpness_score: f64,
    pub noise_level: f64,
    pub skew_angle: f64,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub details: String,
}

/// Outcome of the manipulation scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulationResult {
    pub detected: bool,
    pub confidence: f64,
    pub indicators: Vec<String>,
    pub recommendation: RecommendedAction,
    pub details: String,
}

/// Image quality detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageQualityDetector;

impl ImageQualityDetector {
    pub fn analyze(&self, check: &Check) -> ImageQualityResult {
        match check.metadata.image_quality_score {
            Some(score) => from_supplied_score(score, &check.metadata),
            None => estimate(&check.metadata),
        }
    }

    pub fn scan_manipulation(&self, check: &Check) -> ManipulationResult {
        let metadata = &check.metadata;
        let mut indicators = Vec::new();
        let mut confidence: f64 = 0.0;

        if metadata.has_flag("altered_amount_suspected") {
            indicators.push("Amount field shows signs of alteration".to_string());
            confidence += 0.4;
        }

        if metadata.has_flag("duplicate_check_number_pattern") {
            indicators.push("Check number pattern suggests duplication".to_string());
            confidence += 0.3;
        }

        if metadata.device_lower().contains("emulator") {
            indicators.push("Image source is emulator - high manipulation risk".to_string());
            confidence += 0.5;
        }

        if metadata.image_quality_score.is_some_and(|q| q < 0.5) {
            indicators.push("Low quality may hide manipulation artifacts".to_string());
            confidence += 0.2;
        }

        let recommendation = if confidence >= 0.7 {
            RecommendedAction::Reject
        } else if confidence >= 0.4 {
            RecommendedAction::ManualReview
        } else if confidence >= 0.2 {
            RecommendedAction::FlagForReview
        } else {
            RecommendedAction::Approve
        };

        let confidence = confidence.min(1.0);
        let details = if indicators.is_empty() {
            "No manipulation indicators detected.".to_string()
        } else {
            let mut parts = vec![
                format!("Manipulation Analysis (Confidence: {:.1}%)", confidence * 100.0),
                "\nIndicators Found:".to_string(),
            ];
            parts.extend(indicators.iter().map(|i| format!("  - {}", i)));
            parts.join("\n")
        };

        ManipulationResult {
            detected: !indicators.is_empty(),
            confidence,
            indicators,
            recommendation,
            details,
        }
    }

    pub fn assess(&self, result: &ImageQualityResult) -> RiskAssessment {
        if result.overall_score < 0.3 {
            return RiskAssessment::new(
                RiskLevel::High,
                0.8,
                RecommendedAction::Reject,
                "Image quality too low for reliable verification",
            );
        }

        if result.overall_score < MINIMUM_QUALITY_SCORE {
            return RiskAssessment::new(
                RiskLevel::Medium,
                0.5,
                RecommendedAction::ManualReview,
                "Image quality below acceptable threshold",
            );
        }

        if !result.issues.is_empty() {
            let shown: Vec<&str> = result.issues.iter().take(2).map(String::as_str).collect();
            return RiskAssessment::new(
                RiskLevel::Low,
                0.3,
                RecommendedAction::FlagForReview,
                format!("Quality issues: {}", shown.join(", ")),
            );
        }

        RiskAssessment::new(
            RiskLevel::Low,
            0.1,
            RecommendedAction::Approve,
            "Image quality meets requirements",
        )
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn from_supplied_score(score: f64, metadata: &CheckMetadata) -> ImageQualityResult {
    // (issues, recommendations, brightness, contrast, sharpness, noise)
    let (mut issues, recommendations, brightness, contrast, sharpness, noise) = if score < 0.3 {
        (
            strings(&[
                "Very low image quality",
                "Text may be unreadable",
                "Security features cannot be verified",
            ]),
            strings(&[
                "Recapture image with better lighting",
                "Ensure camera is in focus",
                "Use higher resolution setting",
            ]),
            0.3,
            0.3,
            0.2,
            0.7,
        )
    } else if score < 0.5 {
        (
            strings(&[
                "Below acceptable quality threshold",
                "Some details may be unclear",
            ]),
            strings(&[
                "Consider recapturing for better verification",
                "Improve lighting conditions",
            ]),
            0.5,
            0.5,
            0.4,
            0.5,
        )
    } else if score < 0.7 {
        (
            strings(&["Quality is acceptable but not optimal"]),
            strings(&["Higher quality would improve verification confidence"]),
            0.7,
            0.7,
            0.6,
            0.3,
        )
    } else {
        (Vec::new(), Vec::new(), 0.85, 0.85, 0.8, 0.15)
    };

    if metadata.device_lower().contains("emulator") {
        issues.push("Image captured from emulator device".to_string());
    }

    ImageQualityResult {
        overall_score: score,
        resolution_adequate: score >= 0.5,
        brightness_score: brightness,
        contrast_score: contrast,
        sharpness_score: sharpness,
        noise_level: noise,
        skew_angle: if score > 0.7 { 0.0 } else { 2.5 },
        details: describe(score, &issues),
        issues,
        recommendations,
    }
}

fn estimate(metadata: &CheckMetadata) -> ImageQualityResult {
    let mut score: f64 = 0.85;
    let mut issues = Vec::new();

    match metadata.source.as_deref() {
        Some("mobile_deposit") => score -= 0.05,
        Some("atm_deposit") => {
            score -= 0.1;
            issues.push("ATM capture may have lower quality".to_string());
        }
        _ => {}
    }

    let device = metadata.device_lower();
    if device.contains("emulator") {
        score -= 0.3;
        issues.push("Emulator device detected - suspicious capture method".to_string());
    } else if device.contains("rooted") {
        score -= 0.15;
        issues.push("Rooted device may indicate tampering".to_string());
    } else if device.contains("unknown") {
        score -= 0.1;
        issues.push("Unknown device type".to_string());
    }

    if metadata.has_flag("altered_amount_suspected") {
        score -= 0.2;
        issues.push("Image analysis suggests possible alteration".to_string());
    }

    let score = score.clamp(0.1, 1.0);

    ImageQualityResult {
        overall_score: score,
        resolution_adequate: score >= 0.5,
        brightness_score: score * 0.95,
        contrast_score: score * 0.9,
        sharpness_score: score * 0.85,
        noise_level: 1.0 - score,
        skew_angle: if score > 0.7 { 0.5 } else { 3.0 },
        details: describe(score, &issues),
        issues,
        recommendations: Vec::new(),
    }
}

fn describe(score: f64, issues: &[String]) -> String {
    let mut parts = vec![format!("Image Quality Score: {:.1}%", score * 100.0)];

    parts.push(
        if score >= OPTIMAL_QUALITY_SCORE {
            "Status: Excellent - All quality metrics pass"
        } else if score >= MINIMUM_QUALITY_SCORE {
            "Status: Acceptable - Meets minimum requirements"
        } else {
            "Status: Poor - Below minimum quality threshold"
        }
        .to_string(),
    );

    if !issues.is_empty() {
        parts.push("\nIssues Detected:".to_string());
        parts.extend(issues.iter().map(|i| format!("  - {}", i)));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn check() -> Check {
        Check::new("C1", "CL1", 10_000, "Payee", Utc::now())
    }

    #[test]
    fn test_supplied_score_bands() {
        let mut c = check();
        c.metadata.image_quality_score = Some(0.25);
        let result = ImageQualityDetector.analyze(&c);
        assert_eq!(result.issues.len(), 3);
        assert_eq!(ImageQualityDetector.assess(&result).risk_score, 0.8);

        c.metadata.image_quality_score = Some(0.9);
        let result = ImageQualityDetector.analyze(&c);
        assert!(result.issues.is_empty());
        assert_eq!(ImageQualityDetector.assess(&result).risk_score, 0.1);
    }

    #[test]
    fn test_estimated_score_for_emulator() {
        let mut c = check();
        c.metadata.source = Some("mobile_deposit".into());
        c.metadata.device = Some("Emulator".into());
        let result = ImageQualityDetector.analyze(&c);
        assert!((result.overall_score - 0.5).abs() < 1e-9);
        assert_eq!(ImageQualityDetector.assess(&result).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_manipulation_confidence_capped() {
        let mut c = check();
        c.metadata.flags = vec![
            "altered_amount_suspected".into(),
            "duplicate_check_number_pattern".into(),
        ];
        c.metadata.device = Some("emulator".into());
        let scan = ImageQualityDetector.scan_manipulation(&c);
        assert!(scan.detected);
        assert_eq!(scan.confidence, 1.0);
        assert_eq!(scan.recommendation, RecommendedAction::Reject);
    }
}
