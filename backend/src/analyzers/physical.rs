//! Analyzers: Physical check
//!
//! Runs the document detectors and turns their combined risk into a verdict.
//!
//! Overall risk is the highest detector risk score, raised to the
//! manipulation confidence when manipulation is detected.

use crate::analyzers::detectors::{
    ForgeryScan, ImageQualityDetector, ImageQualityResult, ManipulationResult, MicrResult,
    MicrValidator, RiskAssessment, SignatureDetector, SignatureResult, WatermarkDetector,
    WatermarkResult,
};
use crate::analyzers::{Analyzer, StageError, CHECK_ANALYSIS};
use crate::models::record::{AnalysisRecord, StageOutput, StageUpdate};
use crate::models::verdict::{FraudVerdict, RiskLevel, Verdict};
use crate::rng::RngManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const CRITICAL_FLAGS: [&str; 3] = ["missing_signature", "invalid_micr", "manipulation_suspected"];
const HIGH_RISK_FLAGS: [&str; 2] = ["missing_watermark", "forgery_indicators"];

/// Image quality below this raises `low_image_quality`
const LOW_QUALITY_THRESHOLD: f64 = 0.6;

/// Structured output of the physical-check stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckAnalysis {
    pub watermark: WatermarkResult,
    pub watermark_risk: RiskAssessment,
    pub signature: SignatureResult,
    pub signature_risk: RiskAssessment,
    pub forgery_scan: ForgeryScan,
    pub micr: MicrResult,
    pub micr_risk: RiskAssessment,
    pub image_quality: ImageQualityResult,
    pub image_risk: RiskAssessment,
    pub manipulation: ManipulationResult,
    pub overall_risk: f64,
    pub flags: Vec<String>,
}

impl CheckAnalysis {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Physical-check analyzer
#[derive(Debug, Clone, Default)]
pub struct PhysicalCheckAnalyzer {
    watermark: WatermarkDetector,
    signature: SignatureDetector,
    micr: MicrValidator,
    image: ImageQualityDetector,
}

impl PhysicalCheckAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn verdict(&self, analysis: &CheckAnalysis, findings: Vec<String>, at: DateTime<Utc>) -> Verdict {
        let risk = analysis.overall_risk;
        let has_critical = CRITICAL_FLAGS.iter().any(|f| analysis.has_flag(f));
        let has_high = HIGH_RISK_FLAGS.iter().any(|f| analysis.has_flag(f));

        let (outcome, confidence, level) = if has_critical || risk >= 0.8 {
            (FraudVerdict::Fraud, (risk + 0.1).min(0.95), RiskLevel::Critical)
        } else if has_high || risk >= 0.6 {
            (FraudVerdict::Review, risk, RiskLevel::High)
        } else if risk >= 0.4 {
            (FraudVerdict::Review, risk, RiskLevel::Medium)
        } else {
            (FraudVerdict::NotFraud, 1.0 - risk, RiskLevel::Low)
        };

        Verdict::new(CHECK_ANALYSIS, outcome, confidence, level, reasoning(analysis), at)
            .with_findings(findings)
            .with_recommendations(verdict_recommendations(&analysis.flags))
    }
}

impl Analyzer for PhysicalCheckAnalyzer {
    fn id(&self) -> &'static str {
        CHECK_ANALYSIS
    }

    fn display_name(&self) -> &'static str {
        "Check analysis"
    }

    fn analyze(
        &self,
        record: &AnalysisRecord,
        rng: &mut RngManager,
    ) -> Result<StageUpdate, StageError> {
        let check = &record.check;

        let watermark = self.watermark.analyze(check, rng);
        let watermark_risk = self.watermark.assess(&watermark);

        let signature = self.signature.analyze(check, rng);
        let signature_risk = self.signature.assess(&signature);
        let forgery_scan = self.signature.scan_forgery(check);

        let micr = self.micr.validate(check);
        let micr_risk = self.micr.assess(&micr);

        let image_quality = self.image.analyze(check);
        let image_risk = self.image.assess(&image_quality);
        let manipulation = self.image.scan_manipulation(check);

        let mut flags = Vec::new();
        let mut findings = Vec::new();
        let mut recommendations = Vec::new();

        if !watermark.detected {
            flags.push("missing_watermark".to_string());
            findings.push("Check is missing bank watermark".to_string());
            recommendations.push("Reject check - missing security feature".to_string());
        }

        if !signature.present {
            flags.push("missing_signature".to_string());
            findings.push("Check is missing required signature".to_string());
            recommendations.push("Reject check - unsigned".to_string());
        } else if !signature.forgery_indicators.is_empty() {
            flags.push("forgery_indicators".to_string());
            findings.push(format!(
                "Forgery indicators detected: {}",
                signature.forgery_indicators.join(", ")
            ));
            recommendations.push("Manual signature verification required".to_string());
        }

        if !micr.valid {
            flags.push("invalid_micr".to_string());
            findings.push(format!("MICR validation failed: {}", micr.anomalies.join(", ")));
            recommendations.push("Verify routing and account numbers manually".to_string());
        }

        if image_quality.overall_score < LOW_QUALITY_THRESHOLD {
            flags.push("low_image_quality".to_string());
            findings.push(format!(
                "Image quality score: {:.1}%",
                image_quality.overall_score * 100.0
            ));
            recommendations.push("Request higher quality image if possible".to_string());
        }

        if manipulation.detected {
            flags.push("manipulation_suspected".to_string());
            findings.extend(manipulation.indicators.iter().cloned());
            recommendations.push("Detailed forensic analysis recommended".to_string());
        }

        let mut overall_risk = [
            watermark_risk.risk_score,
            signature_risk.risk_score,
            micr_risk.risk_score,
            image_risk.risk_score,
        ]
        .into_iter()
        .fold(0.0, f64::max);
        if manipulation.detected {
            overall_risk = overall_risk.max(manipulation.confidence);
        }

        let analysis = CheckAnalysis {
            watermark,
            watermark_risk,
            signature,
            signature_risk,
            forgery_scan,
            micr,
            micr_risk,
            image_quality,
            image_risk,
            manipulation,
            overall_risk,
            flags: flags.clone(),
        };

        let verdict = self.verdict(&analysis, findings.clone(), record.as_of);

        Ok(StageUpdate::new()
            .with_verdict(verdict)
            .with_output(StageOutput::Check(analysis))
            .with_flags(flags)
            .with_findings(findings)
            .with_recommendations(recommendations))
    }
}

fn reasoning(analysis: &CheckAnalysis) -> String {
    let mut parts = vec!["Physical Check Analysis Summary:".to_string()];

    if analysis.watermark.detected {
        parts.push(format!(
            "✓ Watermark detected ({:.1}% confidence)",
            analysis.watermark.confidence * 100.0
        ));
    } else {
        parts.push("✗ Watermark NOT detected - critical security concern".to_string());
    }

    let signature = &analysis.signature;
    if signature.present && signature.valid {
        parts.push(format!(
            "✓ Signature valid ({:.1}% confidence)",
            signature.confidence * 100.0
        ));
    } else if signature.present {
        parts.push("⚠ Signature present but validation concerns".to_string());
    } else {
        parts.push("✗ Signature MISSING - check cannot be processed".to_string());
    }

    if analysis.micr.valid {
        parts.push("✓ MICR line valid".to_string());
    } else {
        let shown: Vec<&str> = analysis.micr.anomalies.iter().take(2).map(String::as_str).collect();
        parts.push(format!("✗ MICR validation failed: {}", shown.join(", ")));
    }

    parts.push(format!(
        "Image quality: {:.1}%",
        analysis.image_quality.overall_score * 100.0
    ));

    if !analysis.flags.is_empty() {
        parts.push(format!("\nFlags raised: {}", analysis.flags.join(", ")));
    }

    parts.push(format!(
        "\nOverall physical risk score: {:.1}%",
        analysis.overall_risk * 100.0
    ));

    parts.join("\n")
}

fn verdict_recommendations(flags: &[String]) -> Vec<String> {
    const BY_FLAG: [(&str, &str); 6] = [
        ("missing_signature", "REJECT: Check must be signed"),
        ("missing_watermark", "REJECT: Missing watermark indicates potential counterfeit"),
        ("invalid_micr", "VERIFY: Contact issuing bank to verify account"),
        ("manipulation_suspected", "ESCALATE: Forensic analysis required"),
        ("low_image_quality", "REQUEST: Higher quality image needed"),
        ("forgery_indicators", "REVIEW: Compare with reference signatures on file"),
    ];

    let mut recommendations: Vec<String> = BY_FLAG
        .iter()
        .filter(|(flag, _)| flags.iter().any(|f| f == flag))
        .map(|(_, text)| text.to_string())
        .collect();

    if recommendations.is_empty() {
        recommendations.push("APPROVE: Physical verification passed".to_string());
    }
    recommendations
}
