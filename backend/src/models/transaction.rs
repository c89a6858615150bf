//! Historical transaction model
//!
//! Past check activity for a client. Only used to derive statistics and
//! recent-activity counts; never scored directly.
//!
//! CRITICAL: All money values are i64 (cents)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A settled (or attempted) historical transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTransaction {
    pub transaction_id: String,
    pub client_id: String,
    #[serde(default)]
    pub check_id: Option<String>,
    pub date: DateTime<Utc>,

    /// Amount in cents
    pub amount: i64,

    pub payee: String,

    /// Spending category (`utility`, `rent`, `retail`, ...)
    #[serde(default = "default_transaction_type")]
    pub transaction_type: String,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default)]
    pub location: Option<String>,
}

fn default_transaction_type() -> String {
    "check".to_string()
}

fn default_status() -> String {
    "completed".to_string()
}

impl HistoricalTransaction {
    pub fn new(
        transaction_id: impl Into<String>,
        client_id: impl Into<String>,
        date: DateTime<Utc>,
        amount: i64,
        payee: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            client_id: client_id.into(),
            check_id: None,
            date,
            amount,
            payee: payee.into(),
            transaction_type: default_transaction_type(),
            status: default_status(),
            location: None,
        }
    }

    pub fn with_check_id(mut self, check_id: impl Into<String>) -> Self {
        self.check_id = Some(check_id.into());
        self
    }

    pub fn with_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.transaction_type = transaction_type.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Amount in dollars
    pub fn amount_dollars(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}
