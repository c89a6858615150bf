//! In-memory client and transaction repository
//!
//! Read-only during analysis; shared between stages via `Arc`. Every query
//! that involves time takes the run's `as_of` instant instead of reading the
//! wall clock.

use crate::core::clock::{days_before, days_between, hours_before};
use crate::models::check::Check;
use crate::models::client::Client;
use crate::models::transaction::HistoricalTransaction;
use crate::repository::stats::TransactionStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time windows and thresholds for history queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryWindows {
    /// Days of history that feed statistics
    pub history_days: i64,

    /// Hours that count as "recent" for deposit velocity
    pub velocity_hours: i64,

    /// Accounts younger than this are new
    pub new_account_days: i64,

    /// Dollar amount above which a new-account check is large
    pub large_amount_threshold: f64,
}

impl Default for HistoryWindows {
    fn default() -> Self {
        Self {
            history_days: 365,
            velocity_hours: 24,
            new_account_days: 90,
            large_amount_threshold: 5000.0,
        }
    }
}

/// Result of checking a single check against stored history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnalysis {
    pub client_found: bool,
    pub client_name: String,
    pub account_age_days: i64,
    pub statistics: TransactionStatistics,
    pub amount_anomaly_score: f64,
    pub payee_is_known: bool,
    pub recent_deposits: usize,
    pub client_risk_score: Option<f64>,
    pub flags: Vec<String>,
}

/// Client and transaction store
#[derive(Debug, Clone, Default)]
pub struct Repository {
    clients: BTreeMap<String, Client>,
    transactions: Vec<HistoricalTransaction>,
}

impl Repository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a client
    pub fn add_client(&mut self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }

    pub fn add_transaction(&mut self, transaction: HistoricalTransaction) {
        self.transactions.push(transaction);
    }

    pub fn add_transactions<I>(&mut self, transactions: I)
    where
        I: IntoIterator<Item = HistoricalTransaction>,
    {
        self.transactions.extend(transactions);
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.get(client_id)
    }

    pub fn client_by_account(&self, account_number: &str) -> Option<&Client> {
        self.clients
            .values()
            .find(|c| c.account_number == account_number)
    }

    /// All clients, ordered by id
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Transactions for a client within `days_back` of `as_of`, newest first
    pub fn transactions_for_client(
        &self,
        client_id: &str,
        days_back: i64,
        as_of: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Vec<&HistoricalTransaction> {
        let cutoff = days_before(as_of, days_back);
        let mut found: Vec<&HistoricalTransaction> = self
            .transactions
            .iter()
            .filter(|tx| tx.client_id == client_id && tx.date >= cutoff)
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        found
    }

    /// All transactions from a client to a payee (case-insensitive)
    pub fn transactions_by_payee(&self, client_id: &str, payee: &str) -> Vec<&HistoricalTransaction> {
        let payee = payee.to_lowercase();
        self.transactions
            .iter()
            .filter(|tx| tx.client_id == client_id && tx.payee.to_lowercase() == payee)
            .collect()
    }

    /// Statistics over the client's history window
    pub fn statistics(
        &self,
        client_id: &str,
        days_back: i64,
        as_of: DateTime<Utc>,
    ) -> TransactionStatistics {
        let transactions = self.transactions_for_client(client_id, days_back, as_of, None);
        TransactionStatistics::from_transactions(&transactions)
    }

    /// Whether the payee is in the client's typical payee list
    pub fn is_payee_known(&self, client_id: &str, payee: &str) -> bool {
        self.client(client_id)
            .map(|c| c.is_typical_payee(payee))
            .unwrap_or(false)
    }

    /// How anomalous an amount is for the client, in [0, 1]
    ///
    /// 0.5 without history; with zero spread, 0 for the exact average and
    /// 0.8 otherwise; else `min(|z| / 5, 1)`.
    pub fn amount_anomaly_score(&self, stats: &TransactionStatistics, amount: f64) -> f64 {
        if !stats.has_history() {
            return 0.5;
        }
        let avg = stats.average_amount;
        let std_dev = stats.std_dev_amount;
        if std_dev == 0.0 {
            return if amount == avg { 0.0 } else { 0.8 };
        }
        let z = (amount - avg).abs() / std_dev;
        (z / 5.0).min(1.0)
    }

    /// Deposits recorded in the `hours` before `as_of`
    pub fn recent_deposit_count(&self, client_id: &str, hours: i64, as_of: DateTime<Utc>) -> usize {
        let cutoff = hours_before(as_of, hours);
        self.transactions
            .iter()
            .filter(|tx| tx.client_id == client_id && tx.date >= cutoff)
            .count()
    }

    /// Compare a check against the client's stored history
    pub fn analyze_check_against_history(
        &self,
        check: &Check,
        windows: &HistoryWindows,
        as_of: DateTime<Utc>,
    ) -> HistoryAnalysis {
        self.analyze_check_for_client(check, self.client(&check.client_id), windows, as_of)
    }

    /// Same as [`Repository::analyze_check_against_history`] with an
    /// already-resolved account
    pub fn analyze_check_for_client(
        &self,
        check: &Check,
        client: Option<&Client>,
        windows: &HistoryWindows,
        as_of: DateTime<Utc>,
    ) -> HistoryAnalysis {
        let statistics = self.statistics(&check.client_id, windows.history_days, as_of);
        let amount = check.amount_dollars();

        let mut analysis = HistoryAnalysis {
            client_found: client.is_some(),
            client_name: client
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            account_age_days: 0,
            amount_anomaly_score: self.amount_anomaly_score(&statistics, amount),
            statistics,
            payee_is_known: client.is_some_and(|c| c.is_typical_payee(&check.payee)),
            recent_deposits: self.recent_deposit_count(
                &check.client_id,
                windows.velocity_hours,
                as_of,
            ),
            client_risk_score: None,
            flags: Vec::new(),
        };

        if let Some(client) = client {
            analysis.account_age_days = days_between(client.account_opened_date, as_of);
            analysis.client_risk_score = Some(client.risk_score);
        }

        if analysis.amount_anomaly_score > 0.7 {
            analysis.flags.push("high_amount_anomaly".to_string());
        }
        if !analysis.payee_is_known {
            analysis.flags.push("unknown_payee".to_string());
        }
        if analysis.account_age_days < windows.new_account_days
            && amount > windows.large_amount_threshold
        {
            analysis.flags.push("new_account_large_transaction".to_string());
        }
        if analysis.recent_deposits > 3 {
            analysis.flags.push("rapid_succession_deposits".to_string());
        }
        if let Some(client) = client {
            if check.payee.to_lowercase() == client.name.to_lowercase() {
                analysis.flags.push("self_payee".to_string());
            }
        }

        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn repo() -> Repository {
        let mut repo = Repository::new();
        repo.add_client(
            Client::new("CL1", "Ada Lovelace", "111", as_of() - Duration::days(400))
                .with_typical_payees(["Water Utility"]),
        );
        for (i, days) in [10, 40, 70].iter().enumerate() {
            repo.add_transaction(HistoricalTransaction::new(
                format!("T{}", i),
                "CL1",
                as_of() - Duration::days(*days),
                10_000,
                "Water Utility",
            ));
        }
        repo
    }

    #[test]
    fn test_transactions_newest_first() {
        let repo = repo();
        let txs = repo.transactions_for_client("CL1", 365, as_of(), None);
        assert_eq!(txs.len(), 3);
        assert!(txs[0].date > txs[1].date);
        assert_eq!(repo.transactions_for_client("CL1", 365, as_of(), Some(1)).len(), 1);
        assert_eq!(repo.transactions_for_client("CL1", 30, as_of(), None).len(), 1);
    }

    #[test]
    fn test_huge_windows_cover_all_history() {
        let repo = repo();
        assert_eq!(repo.recent_deposit_count("CL1", i64::MAX, as_of()), 3);
        assert_eq!(repo.transactions_for_client("CL1", i64::MAX, as_of(), None).len(), 3);
    }

    #[test]
    fn test_anomaly_score_zero_spread() {
        let repo = repo();
        let stats = repo.statistics("CL1", 365, as_of());
        assert_eq!(repo.amount_anomaly_score(&stats, 100.0), 0.0);
        assert_eq!(repo.amount_anomaly_score(&stats, 101.0), 0.8);
        assert_eq!(
            repo.amount_anomaly_score(&TransactionStatistics::default(), 100.0),
            0.5
        );
    }

    #[test]
    fn test_payee_lookup_case_insensitive() {
        let repo = repo();
        assert!(repo.is_payee_known("CL1", "water utility"));
        assert!(!repo.is_payee_known("CL1", "Cash"));
        assert!(!repo.is_payee_known("NOPE", "Water Utility"));
        assert_eq!(repo.transactions_by_payee("CL1", "WATER UTILITY").len(), 3);
    }

    #[test]
    fn test_history_flags_for_self_payee() {
        let repo = repo();
        let check = Check::new("C1", "CL1", 10_000, "ada lovelace", as_of());
        let analysis =
            repo.analyze_check_against_history(&check, &HistoryWindows::default(), as_of());
        assert!(analysis.client_found);
        assert_eq!(analysis.account_age_days, 400);
        assert!(analysis.flags.contains(&"self_payee".to_string()));
        assert!(analysis.flags.contains(&"unknown_payee".to_string()));
        assert!(!analysis.flags.contains(&"high_amount_anomaly".to_string()));
    }
}
