//! Detectors: MICR line
//!
//! Parses the magnetic-ink line printed along the bottom of a check:
//!
//! ```text
//! ⑆RRRRRRRRR⑆ ⑈AAAAAAAAAA⑈ CCCC
//! ```
//!
//! Transit symbols around the 9-digit routing number, on-us symbols around
//! the account number, and the check number as the last 3 to 6 digits of the
//! line. Validation is pure: the same line always gives the same result.

use crate::analyzers::detectors::{RecommendedAction, RiskAssessment};
use crate::models::check::Check;
use crate::models::verdict::RiskLevel;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const ROUTING_PATTERN: &str = r"⑆([0-9]{9})⑆";
const ACCOUNT_PATTERN: &str = r"⑈([0-9]+)⑈";
const CHECK_NUMBER_PATTERN: &str = r"([0-9]{3,6})$";

static ROUTING: OnceLock<Option<Regex>> = OnceLock::new();
static ACCOUNT: OnceLock<Option<Regex>> = OnceLock::new();
static CHECK_NUMBER: OnceLock<Option<Regex>> = OnceLock::new();

/// Federal Reserve routing symbol prefixes accepted as valid
const VALID_ROUTING_PREFIXES: [u8; 37] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, // Federal Reserve banks
    21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, // thrifts
    61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, // electronic
    80, // traveler's checks
];

/// Outcome of MICR validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrResult {
    pub present: bool,
    pub valid: bool,
    pub routing_number: Option<String>,
    pub account_number: Option<String>,
    pub check_number: Option<String>,
    pub routing_valid: bool,
    pub anomalies: Vec<String>,
    pub details: String,
}

/// ABA routing number check
///
/// Nine ASCII digits, a known prefix, and
/// `3(d1+d4+d7) + 7(d2+d5+d8) + (d3+d6+d9) ≡ 0 (mod 10)`.
///
/// # Example
/// ```
/// use check_fraud_core_rs::analyzers::detectors::is_valid_routing_number;
///
/// assert!(is_valid_routing_number("021000021"));
/// assert!(!is_valid_routing_number("123456789"));
/// ```
pub fn is_valid_routing_number(routing: &str) -> bool {
    let digits: Vec<u32> = routing.chars().filter_map(|c| c.to_digit(10)).collect();
    if routing.len() != 9 || digits.len() != 9 || !routing.is_ascii() {
        return false;
    }

    let prefix = (digits[0] * 10 + digits[1]) as u8;
    if !VALID_ROUTING_PREFIXES.contains(&prefix) {
        return false;
    }

    let checksum = 3 * (digits[0] + digits[3] + digits[6])
        + 7 * (digits[1] + digits[4] + digits[7])
        + (digits[2] + digits[5] + digits[8]);
    checksum % 10 == 0
}

/// MICR line validator
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrValidator;

impl MicrValidator {
    pub fn validate(&self, check: &Check) -> MicrResult {
        let line = match check.micr_line.as_deref().filter(|l| !l.is_empty()) {
            Some(line) => line,
            None => {
                return MicrResult {
                    present: false,
                    valid: false,
                    routing_number: None,
                    account_number: None,
                    check_number: None,
                    routing_valid: false,
                    anomalies: vec!["MICR line not detected or not provided".to_string()],
                    details: "Missing MICR line - check may be counterfeit or damaged.".to_string(),
                };
            }
        };

        let routing = capture(&ROUTING, ROUTING_PATTERN, line);
        let account = capture(&ACCOUNT, ACCOUNT_PATTERN, line);
        let check_number = capture(&CHECK_NUMBER, CHECK_NUMBER_PATTERN, line.trim_end());

        let mut anomalies = Vec::new();
        let mut routing_valid = false;

        match &routing {
            Some(routing) => {
                routing_valid = is_valid_routing_number(routing);
                if !routing_valid {
                    anomalies.push(format!("Invalid routing number checksum: {}", routing));
                }
                if !check.routing_number.is_empty() && *routing != check.routing_number {
                    anomalies.push(format!(
                        "Routing number mismatch: expected {}, got {}",
                        check.routing_number, routing
                    ));
                }
            }
            None => anomalies.push("Could not extract routing number from MICR line".to_string()),
        }

        match &account {
            Some(account) => {
                if !check.account_number.is_empty() && *account != check.account_number {
                    anomalies.push(format!(
                        "Account number mismatch: expected {}, got {}",
                        check.account_number, account
                    ));
                }
            }
            None => anomalies.push("Could not extract account number from MICR line".to_string()),
        }

        if let Some(number) = &check_number {
            if !check.check_number.is_empty() && *number != check.check_number {
                anomalies.push(format!(
                    "Check number mismatch: expected {}, got {}",
                    check.check_number, number
                ));
            }
        }

        let valid = routing_valid && routing.is_some() && account.is_some() && anomalies.is_empty();
        let details = describe(
            routing.as_deref(),
            account.as_deref(),
            check_number.as_deref(),
            routing_valid,
            &anomalies,
        );

        MicrResult {
            present: true,
            valid,
            routing_number: routing,
            account_number: account,
            check_number,
            routing_valid,
            anomalies,
            details,
        }
    }

    pub fn assess(&self, result: &MicrResult) -> RiskAssessment {
        if !result.present {
            return RiskAssessment::new(
                RiskLevel::Critical,
                0.95,
                RecommendedAction::Reject,
                "Missing MICR line - potential counterfeit",
            );
        }

        if !result.routing_valid {
            return RiskAssessment::new(
                RiskLevel::Critical,
                0.9,
                RecommendedAction::Reject,
                "Invalid routing number",
            );
        }

        if result.anomalies.len() > 2 {
            return RiskAssessment::new(
                RiskLevel::High,
                0.7,
                RecommendedAction::ManualReview,
                format!("Multiple MICR anomalies: {}", result.anomalies.len()),
            );
        }

        if !result.anomalies.is_empty() {
            return RiskAssessment::new(
                RiskLevel::Medium,
                0.4,
                RecommendedAction::FlagForReview,
                format!("MICR anomalies detected: {}", result.anomalies.join(", ")),
            );
        }

        RiskAssessment::new(
            RiskLevel::Low,
            0.05,
            RecommendedAction::Approve,
            "MICR validation passed",
        )
    }
}

/// First capture group of a MICR field pattern, compiled once
fn capture(cell: &'static OnceLock<Option<Regex>>, pattern: &str, line: &str) -> Option<String> {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()?
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn describe(
    routing: Option<&str>,
    account: Option<&str>,
    check_number: Option<&str>,
    routing_valid: bool,
    anomalies: &[String],
) -> String {
    let mut parts = vec!["MICR Line Validation Results:".to_string()];

    if let Some(routing) = routing {
        let status = if routing_valid { "✓ Valid" } else { "✗ Invalid" };
        parts.push(format!("  Routing Number: {} ({})", routing, status));
    }

    if let Some(account) = account {
        let masked = if account.len() > 4 {
            format!("{}{}", &account[..4], "*".repeat(account.len() - 4))
        } else {
            account.to_string()
        };
        parts.push(format!("  Account Number: {}", masked));
    }

    if let Some(number) = check_number {
        parts.push(format!("  Check Number: {}", number));
    }

    if anomalies.is_empty() {
        parts.push("\nNo anomalies detected.".to_string());
    } else {
        parts.push("\nAnomalies Detected:".to_string());
        parts.extend(anomalies.iter().map(|a| format!("  - {}", a)));
    }

    parts.join("\n")
}
