//! Transaction statistics
//!
//! Summary numbers over a client's history window. All amounts in dollars.

use crate::models::transaction::HistoricalTransaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Summary statistics for a set of transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatistics {
    pub total_transactions: usize,
    pub average_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    pub total_amount: f64,

    /// Population standard deviation (0 with fewer than two samples)
    pub std_dev_amount: f64,

    /// Distinct payees, sorted
    pub unique_payees: Vec<String>,
    pub transactions_per_month: f64,
}

impl TransactionStatistics {
    /// Compute statistics over a slice of transactions
    ///
    /// An empty slice yields all-zero statistics.
    pub fn from_transactions(transactions: &[&HistoricalTransaction]) -> Self {
        if transactions.is_empty() {
            return Self::default();
        }

        let amounts: Vec<f64> = transactions.iter().map(|tx| tx.amount_dollars()).collect();
        let count = amounts.len();
        let total: f64 = amounts.iter().sum();
        let mean = total / count as f64;
        let max = amounts.iter().cloned().fold(f64::MIN, f64::max);
        let min = amounts.iter().cloned().fold(f64::MAX, f64::min);

        let payees: BTreeSet<String> = transactions.iter().map(|tx| tx.payee.clone()).collect();

        // Span in whole days, at least one month
        let first = transactions.iter().map(|tx| tx.date).min();
        let last = transactions.iter().map(|tx| tx.date).max();
        let span_days = match (first, last) {
            (Some(first), Some(last)) => (last - first).num_days() as f64,
            _ => 0.0,
        };
        let months = (span_days / 30.0).max(1.0);

        Self {
            total_transactions: count,
            average_amount: mean,
            max_amount: max,
            min_amount: min,
            total_amount: total,
            std_dev_amount: population_std_dev(&amounts),
            unique_payees: payees.into_iter().collect(),
            transactions_per_month: count as f64 / months,
        }
    }

    pub fn has_history(&self) -> bool {
        self.total_transactions > 0
    }
}

/// Population standard deviation; 0 for fewer than two values
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
