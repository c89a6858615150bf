//! Detectors: Signature
//!
//! Presence/validity of the drawer's signature, plus a forgery scan driven by
//! capture metadata.

use crate::analyzers::detectors::{RecommendedAction, RiskAssessment};
use crate::models::check::Check;
use crate::models::verdict::RiskLevel;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

const SUSPICIOUS_DEVICES: [&str; 2] = ["emulator", "rooted android"];

/// Outcome of signature verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureResult {
    pub present: bool,
    pub valid: bool,
    pub confidence: f64,
    pub match_score: Option<f64>,
    pub position_correct: bool,
    pub anomalies: Vec<String>,
    pub forgery_indicators: Vec<String>,
    pub details: String,
}

/// Outcome of the forgery scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgeryScan {
    pub indicators: Vec<String>,
    pub risk_score: f64,
    pub recommendation: RecommendedAction,
    pub details: String,
}

impl ForgeryScan {
    pub fn is_clean(&self) -> bool {
        self.indicators.is_empty()
    }
}

/// Signature detector
#[derive(Debug, Clone, Copy)]
pub struct SignatureDetector {
    pub match_threshold: f64,
    pub minimum_confidence: f64,
}

impl Default for SignatureDetector {
    fn default() -> Self {
        Self {
            match_threshold: 0.85,
            minimum_confidence: 0.7,
        }
    }
}

impl SignatureDetector {
    pub fn analyze(&self, check: &Check, rng: &mut RngManager) -> SignatureResult {
        let metadata = &check.metadata;

        if !check.signature_present || metadata.has_flag("missing_signature") {
            return SignatureResult {
                present: false,
                valid: false,
                confidence: 0.98,
                match_score: None,
                position_correct: false,
                anomalies: vec!["No signature detected in signature field".to_string()],
                forgery_indicators: Vec::new(),
                details: "Check is missing required signature. Cannot process unsigned checks."
                    .to_string(),
            };
        }

        if metadata.has_flag("altered_amount_suspected") {
            return SignatureResult {
                present: true,
                valid: false,
                confidence: 0.75,
                match_score: Some(0.45),
                position_correct: true,
                anomalies: vec![
                    "Signature appears genuine but document may be altered".to_string(),
                    "Ink consistency varies across document".to_string(),
                ],
                forgery_indicators: vec![
                    "inconsistent_pressure".to_string(),
                    "traced_appearance".to_string(),
                ],
                details: "Signature present but document alteration suspected. Manual review required."
                    .to_string(),
            };
        }

        if metadata.image_quality_score.is_some_and(|q| q < 0.5) {
            return SignatureResult {
                present: true,
                valid: true,
                confidence: 0.55,
                match_score: Some(0.6),
                position_correct: true,
                anomalies: vec![
                    "Low image quality affects signature verification accuracy".to_string(),
                ],
                forgery_indicators: Vec::new(),
                details: "Signature detected but image quality is insufficient for reliable verification."
                    .to_string(),
            };
        }

        let confidence = 0.88 + rng.uniform(0.0, 0.1);
        let match_score = 0.90 + rng.uniform(0.0, 0.08);

        SignatureResult {
            present: true,
            valid: true,
            confidence,
            match_score: Some(match_score),
            position_correct: true,
            anomalies: Vec::new(),
            forgery_indicators: Vec::new(),
            details: format!(
                "Signature verified with {:.1}% confidence. Match score: {:.1}%",
                confidence * 100.0,
                match_score * 100.0
            ),
        }
    }

    /// Scan capture metadata for forgery indicators
    pub fn scan_forgery(&self, check: &Check) -> ForgeryScan {
        let metadata = &check.metadata;
        let mut indicators = Vec::new();
        let mut risk: f64 = 0.0;

        if metadata.has_flag("altered_amount_suspected") {
            indicators.push("traced_appearance".to_string());
            indicators.push("inconsistent_pressure".to_string());
            risk += 0.4;
        }

        if metadata.image_quality_score.is_some_and(|q| q < 0.5) {
            indicators.push("low_quality_obscures_details".to_string());
            risk += 0.2;
        }

        if SUSPICIOUS_DEVICES.contains(&metadata.device_lower().as_str()) {
            indicators.push("suspicious_capture_device".to_string());
            risk += 0.3;
        }

        ForgeryScan {
            recommendation: forgery_recommendation(risk),
            details: describe_indicators(&indicators),
            indicators,
            risk_score: risk.min(1.0),
        }
    }

    pub fn assess(&self, result: &SignatureResult) -> RiskAssessment {
        if !result.present {
            return RiskAssessment::new(
                RiskLevel::Critical,
                0.99,
                RecommendedAction::Reject,
                "Missing signature - check cannot be processed",
            );
        }

        if !result.valid {
            return RiskAssessment::new(
                RiskLevel::High,
                0.8,
                RecommendedAction::Reject,
                "Signature validation failed",
            );
        }

        if !result.forgery_indicators.is_empty() {
            return RiskAssessment::new(
                RiskLevel::High,
                0.7,
                RecommendedAction::ManualReview,
                format!("Forgery indicators: {}", result.forgery_indicators.join(", ")),
            );
        }

        if result.confidence < self.minimum_confidence {
            return RiskAssessment::new(
                RiskLevel::Medium,
                0.5,
                RecommendedAction::ManualReview,
                "Low confidence signature verification",
            );
        }

        if let Some(score) = result.match_score.filter(|s| *s < self.match_threshold) {
            return RiskAssessment::new(
                RiskLevel::Medium,
                0.4,
                RecommendedAction::FlagForReview,
                format!("Signature match score below threshold: {:.1}%", score * 100.0),
            );
        }

        RiskAssessment::new(
            RiskLevel::Low,
            0.1,
            RecommendedAction::Approve,
            "Signature verification passed",
        )
    }
}

fn forgery_recommendation(risk: f64) -> RecommendedAction {
    if risk >= 0.7 {
        RecommendedAction::Reject
    } else if risk >= 0.4 {
        RecommendedAction::ManualReview
    } else if risk >= 0.2 {
        RecommendedAction::FlagForReview
    } else {
        RecommendedAction::Approve
    }
}

fn describe_indicators(indicators: &[String]) -> String {
    if indicators.is_empty() {
        return "No forgery indicators detected.".to_string();
    }

    let mut lines = vec!["Forgery indicators detected:".to_string()];
    for indicator in indicators {
        let description = match indicator.as_str() {
            "inconsistent_pressure" => "Varying pressure inconsistent with natural signing",
            "traced_appearance" => "Signature appears traced or copied",
            "low_quality_obscures_details" => "Image quality prevents detailed analysis",
            "suspicious_capture_device" => "Signature captured on suspicious device",
            other => other,
        };
        lines.push(format!("  - {}", description));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn check() -> Check {
        Check::new("C1", "CL1", 10_000, "Payee", Utc::now())
    }

    #[test]
    fn test_missing_signature() {
        let detector = SignatureDetector::default();
        let result = detector.analyze(&check().with_signature(false), &mut RngManager::new(1));
        assert!(!result.present);
        assert_eq!(detector.assess(&result).risk_score, 0.99);
    }

    #[test]
    fn test_forgery_scan_accumulates() {
        let mut c = check();
        c.metadata.flags.push("altered_amount_suspected".into());
        c.metadata.device = Some("Emulator".into());

        let scan = SignatureDetector::default().scan_forgery(&c);
        assert_eq!(scan.indicators.len(), 3);
        assert!((scan.risk_score - 0.7).abs() < 1e-9);
        assert_eq!(scan.recommendation, RecommendedAction::Reject);
    }

    #[test]
    fn test_clean_scan() {
        let scan = SignatureDetector::default().scan_forgery(&check());
        assert!(scan.is_clean());
        assert_eq!(scan.recommendation, RecommendedAction::Approve);
        assert_eq!(scan.details, "No forgery indicators detected.");
    }
}
