//! Check model
//!
//! The instrument under analysis. A check is immutable once built: the
//! pipeline reads it, never writes it.
//!
//! CRITICAL: Money is stored as i64 cents. Rules and statistics see the
//! dollar value through [`Check::amount_dollars`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capture metadata attached to a check
///
/// Known keys are typed; anything else lands in `extra` and is still
/// reachable from rules through `metadata.<key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckMetadata {
    /// Deposit channel (`branch_deposit`, `mobile_deposit`, `atm_deposit`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Capture device description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Flags raised upstream of this system
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Image quality score supplied by the capture channel, in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_quality_score: Option<f64>,

    /// Any other capture attributes
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CheckMetadata {
    /// Whether an upstream flag is present
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Device string, lowercased (empty when unknown)
    pub fn device_lower(&self) -> String {
        self.device.as_deref().unwrap_or_default().to_lowercase()
    }
}

/// A deposited check
///
/// # Example
/// ```
/// use check_fraud_core_rs::Check;
/// use chrono::Utc;
///
/// let check = Check::new("CHECK001", "CLIENT001", 12_550, "Electric Company", Utc::now())
///     .with_check_number("1001")
///     .with_routing("071000013", "1234567890");
/// assert_eq!(check.amount_dollars(), 125.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub check_id: String,
    #[serde(default)]
    pub check_number: String,
    pub client_id: String,
    pub date: DateTime<Utc>,

    /// Face amount in cents
    pub amount: i64,

    #[serde(default)]
    pub amount_written: String,
    pub payee: String,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub routing_number: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub micr_line: Option<String>,
    #[serde(default = "default_true")]
    pub has_watermark: bool,
    #[serde(default = "default_true")]
    pub signature_present: bool,
    #[serde(default)]
    pub metadata: CheckMetadata,
}

fn default_true() -> bool {
    true
}

impl Check {
    /// Create a check with the required fields
    ///
    /// Security features default to present; everything else is empty.
    pub fn new(
        check_id: impl Into<String>,
        client_id: impl Into<String>,
        amount: i64,
        payee: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            check_id: check_id.into(),
            check_number: String::new(),
            client_id: client_id.into(),
            date,
            amount,
            amount_written: String::new(),
            payee: payee.into(),
            memo: None,
            bank_name: String::new(),
            routing_number: String::new(),
            account_number: String::new(),
            image_path: None,
            micr_line: None,
            has_watermark: true,
            signature_present: true,
            metadata: CheckMetadata::default(),
        }
    }

    pub fn with_check_number(mut self, check_number: impl Into<String>) -> Self {
        self.check_number = check_number.into();
        self
    }

    pub fn with_amount_written(mut self, text: impl Into<String>) -> Self {
        self.amount_written = text.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_bank(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = bank_name.into();
        self
    }

    /// Set routing and account numbers
    pub fn with_routing(
        mut self,
        routing_number: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        self.routing_number = routing_number.into();
        self.account_number = account_number.into();
        self
    }

    pub fn with_micr_line(mut self, micr_line: impl Into<String>) -> Self {
        self.micr_line = Some(micr_line.into());
        self
    }

    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_watermark(mut self, present: bool) -> Self {
        self.has_watermark = present;
        self
    }

    pub fn with_signature(mut self, present: bool) -> Self {
        self.signature_present = present;
        self
    }

    pub fn with_metadata(mut self, metadata: CheckMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Face amount in dollars
    pub fn amount_dollars(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_extra_keys_round_trip_through_flatten() {
        let json = r#"{"source": "branch_deposit", "teller_id": "T001"}"#;
        let metadata: CheckMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.source.as_deref(), Some("branch_deposit"));
        assert_eq!(
            metadata.extra.get("teller_id"),
            Some(&serde_json::Value::String("T001".to_string()))
        );
    }

    #[test]
    fn test_security_features_default_to_present() {
        let json = r#"{
            "check_id": "C1",
            "client_id": "CL1",
            "date": "2024-01-01T00:00:00Z",
            "amount": 1000,
            "payee": "Someone"
        }"#;
        let check: Check = serde_json::from_str(json).unwrap();
        assert!(check.has_watermark);
        assert!(check.signature_present);
        assert_eq!(check.amount_dollars(), 10.0);
    }
}
