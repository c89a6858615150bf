//! Rule Engine: Evaluation Context
//!
//! Resolves field names used by rules into values drawn from the check, the
//! account and the history statistics. Missing fields resolve to `None`;
//! resolution never fails.

use crate::core::clock::days_between;
use crate::models::check::Check;
use crate::models::client::Client;
use crate::repository::stats::TransactionStatistics;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::fmt;

/// A resolved field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Numeric view (bools are not numbers here)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Items of a list value; a scalar is a one-item list
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Compare with a JSON literal from a rule definition
    pub fn equals_json(&self, expected: &JsonValue) -> bool {
        match (self, expected) {
            (FieldValue::Bool(a), JsonValue::Bool(b)) => a == b,
            (FieldValue::Number(a), JsonValue::Number(b)) => {
                b.as_f64().map(|b| *a == b).unwrap_or(false)
            }
            (FieldValue::Text(a), JsonValue::String(b)) => a == b,
            (FieldValue::List(a), JsonValue::Array(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| y.as_str() == Some(x.as_str()))
            }
            _ => false,
        }
    }

    /// Convert an arbitrary metadata JSON value
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(FieldValue::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(FieldValue::Number),
            JsonValue::String(s) => Some(FieldValue::Text(s.clone())),
            JsonValue::Array(items) => Some(FieldValue::List(
                items
                    .iter()
                    .map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            JsonValue::Object(_) => Some(FieldValue::Text(value.to_string())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Inputs a rule is evaluated against
///
/// Field names:
/// - `metadata.<key>` reads the check's metadata bag
/// - `client.<key>` reads the account (absent without an account)
/// - `account_age_days` is whole days from account opening to `as_of`
/// - anything else reads the check; `amount` is in dollars
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub check: &'a Check,
    pub client: Option<&'a Client>,
    pub stats: Option<&'a TransactionStatistics>,
    pub as_of: DateTime<Utc>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        check: &'a Check,
        client: Option<&'a Client>,
        stats: Option<&'a TransactionStatistics>,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            check,
            client,
            stats,
            as_of,
        }
    }

    /// Resolve a field name
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        if let Some(key) = name.strip_prefix("metadata.") {
            return self.metadata_field(key);
        }
        if let Some(key) = name.strip_prefix("client.") {
            return self.client.and_then(|c| client_field(c, key));
        }
        if name == "account_age_days" {
            return self
                .client
                .map(|c| FieldValue::Number(days_between(c.account_opened_date, self.as_of) as f64));
        }
        check_field(self.check, name)
    }

    fn metadata_field(&self, key: &str) -> Option<FieldValue> {
        let metadata = &self.check.metadata;
        match key {
            "source" => metadata.source.clone().map(FieldValue::Text),
            "device" => metadata.device.clone().map(FieldValue::Text),
            "flags" => Some(FieldValue::List(metadata.flags.clone())),
            "image_quality_score" => metadata.image_quality_score.map(FieldValue::Number),
            other => metadata.extra.get(other).and_then(FieldValue::from_json),
        }
    }
}

fn text(value: &str) -> Option<FieldValue> {
    Some(FieldValue::Text(value.to_string()))
}

fn check_field(check: &Check, name: &str) -> Option<FieldValue> {
    match name {
        "check_id" => text(&check.check_id),
        "check_number" => text(&check.check_number),
        "client_id" => text(&check.client_id),
        "date" => text(&check.date.to_rfc3339()),
        "amount" => Some(FieldValue::Number(check.amount_dollars())),
        "amount_written" => text(&check.amount_written),
        "payee" => text(&check.payee),
        "memo" => check.memo.as_deref().and_then(text),
        "bank_name" => text(&check.bank_name),
        "routing_number" => text(&check.routing_number),
        "account_number" => text(&check.account_number),
        "image_path" => check.image_path.as_deref().and_then(text),
        "micr_line" => check.micr_line.as_deref().and_then(text),
        "has_watermark" => Some(FieldValue::Bool(check.has_watermark)),
        "signature_present" => Some(FieldValue::Bool(check.signature_present)),
        _ => None,
    }
}

fn client_field(client: &Client, key: &str) -> Option<FieldValue> {
    match key {
        "client_id" => text(&client.client_id),
        "name" => text(&client.name),
        "account_number" => text(&client.account_number),
        "bank_name" => text(&client.bank_name),
        "address" => text(&client.address),
        "phone" => client.phone.as_deref().and_then(text),
        "email" => client.email.as_deref().and_then(text),
        "account_opened_date" => text(&client.account_opened_date.to_rfc3339()),
        "average_monthly_transactions" => {
            Some(FieldValue::Number(client.average_monthly_transactions))
        }
        "average_check_amount" => Some(FieldValue::Number(client.average_check_amount)),
        "typical_payees" => Some(FieldValue::List(client.typical_payees.clone())),
        "risk_score" => Some(FieldValue::Number(client.risk_score)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check::CheckMetadata;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_field_resolution_sources() {
        let mut metadata = CheckMetadata::default();
        metadata.device = Some("Emulator".into());
        metadata.extra.insert("teller_id".into(), JsonValue::from("T9"));
        let check = Check::new("C", "CL", 12_345, "Cash", as_of()).with_metadata(metadata);
        let client = Client::new("CL", "Pat", "1", as_of() - Duration::days(30));
        let ctx = RuleContext::new(&check, Some(&client), None, as_of());

        assert_eq!(ctx.field("amount"), Some(FieldValue::Number(123.45)));
        assert_eq!(ctx.field("metadata.device"), Some(FieldValue::Text("Emulator".into())));
        assert_eq!(ctx.field("metadata.teller_id"), Some(FieldValue::Text("T9".into())));
        assert_eq!(ctx.field("client.name"), Some(FieldValue::Text("Pat".into())));
        assert_eq!(ctx.field("account_age_days"), Some(FieldValue::Number(30.0)));
        assert_eq!(ctx.field("no_such_field"), None);
        assert_eq!(ctx.field("metadata.image_quality_score"), None);
    }

    #[test]
    fn test_account_fields_absent_without_client() {
        let check = Check::new("C", "CL", 100, "Cash", as_of());
        let ctx = RuleContext::new(&check, None, None, as_of());
        assert_eq!(ctx.field("client.name"), None);
        assert_eq!(ctx.field("account_age_days"), None);
    }

    #[test]
    fn test_equals_json() {
        assert!(FieldValue::Bool(false).equals_json(&JsonValue::Bool(false)));
        assert!(FieldValue::Number(90.0).equals_json(&serde_json::json!(90)));
        assert!(!FieldValue::Text("90".into()).equals_json(&serde_json::json!(90)));
    }
}
