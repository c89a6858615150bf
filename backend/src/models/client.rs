//! Client (account holder) model
//!
//! Baseline behaviour the history and policy stages compare a check against.
//! Read-only during analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account holder profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub name: String,
    pub account_number: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub account_opened_date: DateTime<Utc>,
    #[serde(default)]
    pub average_monthly_transactions: f64,

    /// Average check amount in dollars
    #[serde(default)]
    pub average_check_amount: f64,

    #[serde(default)]
    pub typical_payees: Vec<String>,

    /// Precomputed risk score in [0, 1]
    #[serde(default)]
    pub risk_score: f64,
}

impl Client {
    /// Create a client with empty behavioural baseline
    pub fn new(
        client_id: impl Into<String>,
        name: impl Into<String>,
        account_number: impl Into<String>,
        account_opened_date: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            name: name.into(),
            account_number: account_number.into(),
            bank_name: String::new(),
            address: String::new(),
            phone: None,
            email: None,
            account_opened_date,
            average_monthly_transactions: 0.0,
            average_check_amount: 0.0,
            typical_payees: Vec::new(),
            risk_score: 0.0,
        }
    }

    pub fn with_typical_payees<I, S>(mut self, payees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.typical_payees = payees.into_iter().map(Into::into).collect();
        self
    }

    /// Set the precomputed risk score (clamped to [0, 1])
    pub fn with_risk_score(mut self, risk_score: f64) -> Self {
        self.risk_score = risk_score.clamp(0.0, 1.0);
        self
    }

    /// Set monthly transaction rate and average amount (dollars)
    pub fn with_baseline(mut self, monthly_transactions: f64, average_check_amount: f64) -> Self {
        self.average_monthly_transactions = monthly_transactions;
        self.average_check_amount = average_check_amount;
        self
    }

    pub fn with_bank(mut self, bank_name: impl Into<String>) -> Self {
        self.bank_name = bank_name.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Case-insensitive membership in the typical payee list
    pub fn is_typical_payee(&self, payee: &str) -> bool {
        let payee = payee.to_lowercase();
        self.typical_payees.iter().any(|p| p.to_lowercase() == payee)
    }

    /// Whole days the account has been open as of `as_of`
    pub fn account_age_days(&self, as_of: DateTime<Utc>) -> i64 {
        crate::core::clock::days_between(self.account_opened_date, as_of)
    }
}
