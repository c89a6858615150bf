//! Analyzers: Transaction history
//!
//! Compares the check against the account's stored behaviour: amount against
//! the historical distribution, payee against typical payees, recent deposit
//! velocity, and account age.
//!
//! An unknown account is not an error: the stage still returns exactly one
//! review verdict flagged `unknown_client`.

use crate::analyzers::{Analyzer, StageError, TRANSACTION_HISTORY};
use crate::core::format::{format_dollars, percent};
use crate::models::check::Check;
use crate::models::client::Client;
use crate::models::record::{AnalysisRecord, StageOutput, StageUpdate};
use crate::models::verdict::{FraudVerdict, RiskLevel, Verdict};
use crate::repository::stats::TransactionStatistics;
use crate::repository::store::{HistoryAnalysis, HistoryWindows, Repository};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SUSPICIOUS_PAYEE_KEYWORDS: [&str; 9] = [
    "cash",
    "bearer",
    "quick cash",
    "fast money",
    "wire",
    "overseas",
    "foreign",
    "unknown",
    "anonymous",
];

/// More deposits than this inside the velocity window is unusual
const VELOCITY_LIMIT: usize = 3;

/// Amount compared with the account's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountAnalysis {
    pub is_anomalous: bool,
    pub severity: RiskLevel,
    pub details: String,
    pub z_score: Option<f64>,
    pub percent_of_average: Option<f64>,
    pub exceeds_historical_max: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayeeAnalysis {
    pub is_known: bool,
    pub is_suspicious: bool,
    pub is_self_payee: bool,
    pub previous_transactions: usize,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityAnalysis {
    pub is_unusual: bool,
    pub recent_deposits: usize,
    pub window_hours: i64,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAnalysis {
    pub age_days: i64,
    pub is_new_account: bool,
    pub risk_score: f64,
    pub average_monthly_transactions: f64,
}

/// Structured output of the transaction-history stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAnalysis {
    pub client_found: bool,
    pub statistics: TransactionStatistics,
    pub amount_anomaly_score: f64,
    pub amount: Option<AmountAnalysis>,
    pub payee: Option<PayeeAnalysis>,
    pub velocity: Option<VelocityAnalysis>,
    pub account: Option<AccountAnalysis>,
    pub risk_score: f64,
    pub flags: Vec<String>,
}

/// Transaction-history analyzer
#[derive(Debug, Clone)]
pub struct TransactionHistoryAnalyzer {
    repository: Arc<Repository>,
    windows: HistoryWindows,
}

impl TransactionHistoryAnalyzer {
    pub fn new(repository: Arc<Repository>, windows: HistoryWindows) -> Self {
        Self {
            repository,
            windows,
        }
    }

    fn unknown_client(&self, record: &AnalysisRecord) -> StageUpdate {
        let findings = vec![format!(
            "Client ID '{}' not found in database",
            record.check.client_id
        )];

        let analysis = TransactionAnalysis {
            client_found: false,
            statistics: TransactionStatistics::default(),
            amount_anomaly_score: 0.5,
            amount: None,
            payee: None,
            velocity: None,
            account: None,
            risk_score: 0.6,
            flags: vec!["unknown_client".to_string()],
        };

        let verdict = Verdict::new(
            TRANSACTION_HISTORY,
            FraudVerdict::Review,
            0.6,
            RiskLevel::High,
            "Client not found in database. Cannot perform historical analysis. Manual verification required.",
            record.as_of,
        )
        .with_findings(findings.clone())
        .with_recommendations(vec![
            "Verify client identity".to_string(),
            "Check account exists in core banking system".to_string(),
        ]);

        StageUpdate::new()
            .with_verdict(verdict)
            .with_output(StageOutput::Transaction(analysis))
            .with_flags(vec!["unknown_client".to_string()])
            .with_findings(findings)
            .with_recommendations(vec!["Verify client identity".to_string()])
    }

    fn analyze_payee(&self, check: &Check, client: &Client, history: &HistoryAnalysis) -> PayeeAnalysis {
        let payee_lower = check.payee.to_lowercase();
        let is_known = history.payee_is_known;
        let is_suspicious = SUSPICIOUS_PAYEE_KEYWORDS
            .iter()
            .any(|kw| payee_lower.contains(kw));
        let is_self_payee = payee_lower == client.name.to_lowercase();

        let mut parts = vec![format!("Payee: {}", check.payee)];
        parts.push(if is_known {
            "✓ Known payee from transaction history".to_string()
        } else {
            "⚠ New payee - not in typical payee list".to_string()
        });
        if is_suspicious {
            parts.push("⚠ Payee name contains suspicious keywords".to_string());
        }
        if is_self_payee {
            parts.push("⚠ Self-payee check detected".to_string());
        }

        PayeeAnalysis {
            is_known,
            is_suspicious,
            is_self_payee,
            previous_transactions: self
                .repository
                .transactions_by_payee(&client.client_id, &check.payee)
                .len(),
            details: parts.join(" | "),
        }
    }

    fn analyze_velocity(&self, history: &HistoryAnalysis) -> VelocityAnalysis {
        let recent = history.recent_deposits;
        let is_unusual = recent > VELOCITY_LIMIT;
        let mut details = format!(
            "{} deposits in last {} hours",
            recent, self.windows.velocity_hours
        );
        if is_unusual {
            details.push_str(" - unusual activity");
        }

        VelocityAnalysis {
            is_unusual,
            recent_deposits: recent,
            window_hours: self.windows.velocity_hours,
            details,
        }
    }

    fn analyze_account(&self, client: &Client, record: &AnalysisRecord) -> AccountAnalysis {
        let age_days = client.account_age_days(record.as_of);
        AccountAnalysis {
            age_days,
            is_new_account: age_days < self.windows.new_account_days,
            risk_score: client.risk_score,
            average_monthly_transactions: client.average_monthly_transactions,
        }
    }
}

impl Analyzer for TransactionHistoryAnalyzer {
    fn id(&self) -> &'static str {
        TRANSACTION_HISTORY
    }

    fn display_name(&self) -> &'static str {
        "Transaction history"
    }

    fn analyze(
        &self,
        record: &AnalysisRecord,
        _rng: &mut RngManager,
    ) -> Result<StageUpdate, StageError> {
        let check = &record.check;
        let client = match record
            .client
            .clone()
            .or_else(|| self.repository.client(&check.client_id).cloned())
        {
            Some(client) => client,
            None => return Ok(self.unknown_client(record)),
        };

        let history = self.repository.analyze_check_for_client(
            check,
            Some(&client),
            &self.windows,
            record.as_of,
        );

        let amount_value = check.amount_dollars();
        let amount = analyze_amount(amount_value, &history.statistics);
        let payee = self.analyze_payee(check, &client, &history);
        let velocity = self.analyze_velocity(&history);
        let account = self.analyze_account(&client, record);

        let mut flags: Vec<String> = Vec::new();
        let mut findings = Vec::new();
        let mut recommendations = Vec::new();

        if amount.is_anomalous {
            flags.push("amount_anomaly".to_string());
            findings.push(amount.details.clone());
            if amount.severity == RiskLevel::High {
                recommendations.push("Verify transaction with account holder".to_string());
            }
        }

        if !payee.is_known {
            flags.push("unknown_payee".to_string());
            findings.push(format!("Payee '{}' not in typical payee list", check.payee));
            if payee.is_suspicious {
                recommendations.push("Verify payee legitimacy".to_string());
            }
        }

        if velocity.is_unusual {
            flags.push("unusual_velocity".to_string());
            findings.push(velocity.details.clone());
            recommendations.push("Review recent transaction pattern".to_string());
        }

        if account.is_new_account && amount_value > self.windows.large_amount_threshold {
            flags.push("new_account_large_transaction".to_string());
            findings.push(format!(
                "Large transaction (${}) from account only {} days old",
                format_dollars(amount_value),
                account.age_days
            ));
            recommendations.push("Enhanced verification for new account".to_string());
        }

        for flag in &history.flags {
            if !flags.contains(flag) {
                flags.push(flag.clone());
            }
        }

        let risk = risk_score(&amount, &payee, &velocity, &account);
        let (outcome, level) = if risk >= 0.7 {
            (FraudVerdict::Fraud, RiskLevel::Critical)
        } else if risk >= 0.5 {
            (FraudVerdict::Review, RiskLevel::High)
        } else if risk >= 0.3 {
            (FraudVerdict::Review, RiskLevel::Medium)
        } else {
            (FraudVerdict::NotFraud, RiskLevel::Low)
        };
        let confidence = 0.7 + 0.3 * (1.0 - (risk - 0.5).abs() * 2.0);

        let reasoning = reasoning(&amount, &payee, &velocity, &account, risk);
        let verdict = Verdict::new(TRANSACTION_HISTORY, outcome, confidence, level, reasoning, record.as_of)
            .with_findings(findings.clone())
            .with_recommendations(verdict_recommendations(&flags));

        let analysis = TransactionAnalysis {
            client_found: true,
            statistics: history.statistics.clone(),
            amount_anomaly_score: history.amount_anomaly_score,
            amount: Some(amount),
            payee: Some(payee),
            velocity: Some(velocity),
            account: Some(account),
            risk_score: risk,
            flags: flags.clone(),
        };

        Ok(StageUpdate::new()
            .with_client(client)
            .with_verdict(verdict)
            .with_output(StageOutput::Transaction(analysis))
            .with_flags(flags)
            .with_findings(findings)
            .with_recommendations(recommendations))
    }
}

/// Classify a dollar amount against history statistics
pub fn analyze_amount(amount: f64, stats: &TransactionStatistics) -> AmountAnalysis {
    if !stats.has_history() {
        return AmountAnalysis {
            is_anomalous: true,
            severity: RiskLevel::Medium,
            details: "No transaction history - cannot establish baseline".to_string(),
            z_score: None,
            percent_of_average: None,
            exceeds_historical_max: false,
        };
    }

    let avg = stats.average_amount;
    let std_dev = stats.std_dev_amount;
    let z = if std_dev > 0.0 {
        (amount - avg) / std_dev
    } else if amount == avg {
        0.0
    } else {
        5.0
    };
    let pct = if avg > 0.0 { amount / avg * 100.0 } else { 0.0 };

    let (is_anomalous, severity, details) = if z > 4.0 || pct > 1000.0 {
        (
            true,
            RiskLevel::Critical,
            format!(
                "Amount ${} is {:.0}% of average (${}). Z-score: {:.1}",
                format_dollars(amount),
                pct,
                format_dollars(avg),
                z
            ),
        )
    } else if z > 3.0 || pct > 500.0 {
        (
            true,
            RiskLevel::High,
            format!(
                "Amount ${} significantly exceeds average ${} (Z-score: {:.1})",
                format_dollars(amount),
                format_dollars(avg),
                z
            ),
        )
    } else if z > 2.0 {
        (
            true,
            RiskLevel::Medium,
            format!(
                "Amount ${} above typical range (avg: ${})",
                format_dollars(amount),
                format_dollars(avg)
            ),
        )
    } else {
        (
            false,
            RiskLevel::Low,
            format!(
                "Amount ${} within normal range (avg: ${})",
                format_dollars(amount),
                format_dollars(avg)
            ),
        )
    };

    AmountAnalysis {
        is_anomalous,
        severity,
        details,
        z_score: Some(z),
        percent_of_average: Some(pct),
        exceeds_historical_max: amount > stats.max_amount,
    }
}

fn risk_score(
    amount: &AmountAnalysis,
    payee: &PayeeAnalysis,
    velocity: &VelocityAnalysis,
    account: &AccountAnalysis,
) -> f64 {
    let mut risk = match amount.severity {
        RiskLevel::Critical => 0.5,
        RiskLevel::High => 0.3,
        RiskLevel::Medium => 0.15,
        RiskLevel::Low => 0.0,
    };

    if payee.is_suspicious {
        risk += 0.25;
    } else if !payee.is_known {
        risk += 0.1;
    }
    if payee.is_self_payee {
        risk += 0.15;
    }
    if velocity.is_unusual {
        risk += 0.2;
    }
    if account.is_new_account {
        risk += 0.1;
    }
    risk += account.risk_score * 0.2;

    risk.min(1.0)
}

fn reasoning(
    amount: &AmountAnalysis,
    payee: &PayeeAnalysis,
    velocity: &VelocityAnalysis,
    account: &AccountAnalysis,
    risk: f64,
) -> String {
    [
        "Transaction History Analysis:".to_string(),
        format!("\nAmount Analysis: {}", amount.details),
        format!("Payee Analysis: {}", payee.details),
        format!("Velocity: {}", velocity.details),
        format!("Account Age: {} days", account.age_days),
        format!("Client Risk Score: {:.2}", account.risk_score),
        format!("\nOverall Historical Risk Score: {}", percent(risk)),
    ]
    .join("\n")
}

fn verdict_recommendations(flags: &[String]) -> Vec<String> {
    const BY_FLAG: [(&str, &str); 5] = [
        ("amount_anomaly", "Contact account holder to verify transaction"),
        ("unknown_payee", "Verify payee identity and relationship"),
        ("unusual_velocity", "Review all recent transactions for pattern"),
        ("new_account_large_transaction", "Apply enhanced due diligence for new account"),
        ("self_payee", "Verify purpose of self-payee check"),
    ];

    let mut recommendations: Vec<String> = BY_FLAG
        .iter()
        .filter(|(flag, _)| flags.iter().any(|f| f == flag))
        .map(|(_, text)| text.to_string())
        .collect();

    if recommendations.is_empty() {
        recommendations.push("Transaction history consistent with client behavior".to_string());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(avg: f64, std_dev: f64) -> TransactionStatistics {
        TransactionStatistics {
            total_transactions: 12,
            average_amount: avg,
            max_amount: avg * 1.2,
            min_amount: avg * 0.8,
            total_amount: avg * 12.0,
            std_dev_amount: std_dev,
            unique_payees: Vec::new(),
            transactions_per_month: 1.0,
        }
    }

    #[test]
    fn test_amount_without_history() {
        let analysis = analyze_amount(100.0, &TransactionStatistics::default());
        assert!(analysis.is_anomalous);
        assert_eq!(analysis.severity, RiskLevel::Medium);
        assert_eq!(analysis.z_score, None);
    }

    #[test]
    fn test_amount_bands() {
        assert_eq!(analyze_amount(100.0, &stats(100.0, 10.0)).severity, RiskLevel::Low);
        assert_eq!(analyze_amount(125.0, &stats(100.0, 10.0)).severity, RiskLevel::Medium);
        assert_eq!(analyze_amount(135.0, &stats(100.0, 10.0)).severity, RiskLevel::High);
        assert_eq!(analyze_amount(15_000.0, &stats(100.0, 10.0)).severity, RiskLevel::Critical);
    }

    #[test]
    fn test_zero_spread() {
        assert_eq!(analyze_amount(100.0, &stats(100.0, 0.0)).z_score, Some(0.0));
        assert_eq!(analyze_amount(101.0, &stats(100.0, 0.0)).z_score, Some(5.0));
    }

    #[test]
    fn test_critical_details_format() {
        let analysis = analyze_amount(15_000.0, &stats(150.0, 10.0));
        assert!(analysis
            .details
            .starts_with("Amount $15,000.00 is 10000% of average ($150.00)"));
    }
}
