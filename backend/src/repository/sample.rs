//! Sample data set
//!
//! Four clients, a year of monthly transactions per client and eight sample
//! checks (three legitimate, five fraudulent). Transaction amounts and dates
//! are drawn from a seeded [`RngManager`], and every date is relative to the
//! supplied `as_of` instant, so the same seed and instant always rebuild the
//! same repository.

use crate::models::check::{Check, CheckMetadata};
use crate::models::client::Client;
use crate::models::transaction::HistoricalTransaction;
use crate::repository::store::Repository;
use crate::rng::RngManager;
use chrono::{DateTime, Duration, TimeZone, Utc};

const DOWNLOADED_SAMPLE_IMAGE: &str = "sample_checks/downloaded/sample_cheque.jpeg";

/// (payee, base amount in dollars, category)
type Template = (&'static str, f64, &'static str);

const CLIENT001_TEMPLATES: &[Template] = &[
    ("Electric Company", 125.50, "utility"),
    ("Water Utility", 45.00, "utility"),
    ("ABC Grocery", 89.99, "retail"),
    ("City Rent LLC", 1200.00, "rent"),
    ("Gas Station Plus", 55.00, "fuel"),
];

const CLIENT002_TEMPLATES: &[Template] = &[
    ("Gas Company", 78.50, "utility"),
    ("Insurance Co", 150.00, "insurance"),
    ("Local Market", 65.00, "retail"),
    ("Phone Bill", 85.00, "utility"),
];

const CLIENT003_TEMPLATES: &[Template] = &[
    ("Phone Company", 95.00, "utility"),
    ("Internet Provider", 79.99, "utility"),
    ("Coffee Shop", 25.00, "retail"),
];

const CLIENT004_TEMPLATES: &[Template] = &[("Unknown Vendor", 50.00, "unknown")];

fn opened(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn dollars(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// The four sample account holders
pub fn sample_clients() -> Vec<Client> {
    let mut john = Client::new("CLIENT001", "John Smith", "1234567890", opened(2018, 3, 15))
        .with_bank("First National Bank")
        .with_address("123 Main Street, Springfield, IL 62701")
        .with_baseline(8.5, 450.00)
        .with_typical_payees(["Electric Company", "Water Utility", "ABC Grocery", "City Rent LLC"])
        .with_risk_score(0.15);
    john.phone = Some("555-123-4567".to_string());
    john.email = Some("john.smith@email.com".to_string());

    let mut jane = Client::new("CLIENT002", "Jane Doe", "0987654321", opened(2020, 7, 22))
        .with_bank("First National Bank")
        .with_address("456 Oak Avenue, Springfield, IL 62702")
        .with_baseline(5.2, 280.00)
        .with_typical_payees(["Gas Company", "Insurance Co", "Local Market"])
        .with_risk_score(0.10);
    jane.phone = Some("555-987-6543".to_string());
    jane.email = Some("jane.doe@email.com".to_string());

    let mut robert = Client::new("CLIENT003", "Robert Johnson", "5555666677", opened(2022, 1, 10))
        .with_bank("First National Bank")
        .with_address("789 Pine Road, Springfield, IL 62703")
        .with_baseline(3.0, 150.00)
        .with_typical_payees(["Phone Company", "Internet Provider"])
        .with_risk_score(0.25);
    robert.phone = Some("555-456-7890".to_string());
    robert.email = Some("r.johnson@email.com".to_string());

    let mut suspicious = Client::new("CLIENT004", "Suspicious Corp", "9999888877", opened(2023, 11, 1))
        .with_bank("First National Bank")
        .with_address("999 Shadow Lane, Springfield, IL 62704")
        .with_baseline(1.0, 50.00)
        .with_risk_score(0.75);
    suspicious.phone = Some("555-000-0000".to_string());
    suspicious.email = Some("contact@suspicious.com".to_string());

    vec![john, jane, robert, suspicious]
}

/// A year of monthly transactions per sample client
///
/// Each template recurs once per 30-day block with ±10% amount jitter and a
/// random day offset inside the block.
pub fn sample_transactions(seed: u64, as_of: DateTime<Utc>) -> Vec<HistoricalTransaction> {
    let mut rng = RngManager::new(seed);
    let base_date = as_of - Duration::days(365);
    let plan: [(&str, &[Template]); 4] = [
        ("CLIENT001", CLIENT001_TEMPLATES),
        ("CLIENT002", CLIENT002_TEMPLATES),
        ("CLIENT003", CLIENT003_TEMPLATES),
        ("CLIENT004", CLIENT004_TEMPLATES),
    ];

    let mut transactions = Vec::new();
    let mut tx_id = 1000;
    for (client_id, templates) in plan {
        for month in 0..12 {
            for (payee, base_amount, category) in templates {
                let amount = base_amount * (1.0 + rng.uniform(-0.1, 0.1));
                let date = base_date + Duration::days(month * 30 + rng.range(0, 29));

                transactions.push(
                    HistoricalTransaction::new(
                        format!("TX{:06}", tx_id),
                        client_id,
                        date,
                        dollars(amount),
                        *payee,
                    )
                    .with_check_id(format!("CHK{:06}", tx_id))
                    .with_type(*category)
                    .with_location("Springfield, IL"),
                );
                tx_id += 1;
            }
        }
    }
    transactions
}

fn metadata(source: &str) -> CheckMetadata {
    CheckMetadata {
        source: Some(source.to_string()),
        ..CheckMetadata::default()
    }
}

fn flags(list: &[&str]) -> Vec<String> {
    list.iter().map(|f| f.to_string()).collect()
}

fn micr(routing: &str, account: &str, number: &str) -> String {
    format!("⑆{}⑆ ⑈{}⑈ {}", routing, account, number)
}

/// Sample checks: (legitimate, fraudulent)
pub fn sample_checks(as_of: DateTime<Utc>) -> (Vec<Check>, Vec<Check>) {
    let routing = "071000013";

    let mut teller = metadata("branch_deposit");
    teller
        .extra
        .insert("teller_id".to_string(), serde_json::Value::from("T001"));

    let mut iphone = metadata("mobile_deposit");
    iphone.device = Some("iPhone".to_string());

    let legitimate = vec![
        Check::new("CHECK001", "CLIENT001", dollars(125.50), "Electric Company", as_of - Duration::days(5))
            .with_check_number("1001")
            .with_amount_written("One hundred twenty-five and 50/100")
            .with_memo("Monthly electric bill")
            .with_bank("First National Bank")
            .with_routing(routing, "1234567890")
            .with_image_path(DOWNLOADED_SAMPLE_IMAGE)
            .with_micr_line(micr(routing, "1234567890", "1001"))
            .with_metadata(teller),
        Check::new("CHECK002", "CLIENT001", dollars(450.00), "City Rent LLC", as_of - Duration::days(3))
            .with_check_number("1002")
            .with_amount_written("Four hundred fifty and 00/100")
            .with_memo("December rent")
            .with_bank("First National Bank")
            .with_routing(routing, "1234567890")
            .with_image_path("sample_checks/legitimate_check_002.png")
            .with_micr_line(micr(routing, "1234567890", "1002"))
            .with_metadata(iphone),
        Check::new("CHECK003", "CLIENT002", dollars(150.00), "Insurance Co", as_of - Duration::days(7))
            .with_check_number("2001")
            .with_amount_written("One hundred fifty and 00/100")
            .with_memo("Auto insurance premium")
            .with_bank("First National Bank")
            .with_routing(routing, "0987654321")
            .with_image_path("sample_checks/legitimate_check_003.png")
            .with_micr_line(micr(routing, "0987654321", "2001"))
            .with_metadata(metadata("mail_deposit")),
    ];

    let fraudulent = vec![
        Check::new("CHECK_FRAUD001", "CLIENT001", dollars(9500.00), "Cash", as_of - Duration::days(1))
            .with_check_number("1099")
            .with_amount_written("Nine thousand five hundred and 00/100")
            .with_memo("")
            .with_bank("First National Bank")
            .with_routing(routing, "1234567890")
            .with_image_path(DOWNLOADED_SAMPLE_IMAGE)
            .with_micr_line(micr(routing, "1234567890", "1099"))
            .with_watermark(false)
            .with_metadata(CheckMetadata {
                device: Some("Unknown Android".to_string()),
                flags: flags(&["amount_anomaly", "missing_watermark", "unusual_payee"]),
                ..metadata("mobile_deposit")
            }),
        Check::new("CHECK_FRAUD002", "CLIENT001", dollars(2500.00), "John Smith", as_of)
            .with_check_number("1003")
            .with_amount_written("Two thousand five hundred and 00/100")
            .with_memo("Self")
            .with_bank("First National Bank")
            .with_routing(routing, "1234567890")
            .with_image_path("sample_checks/suspicious_check_002.png")
            .with_micr_line(micr(routing, "1234567890", "1003"))
            .with_signature(false)
            .with_metadata(CheckMetadata {
                flags: flags(&["missing_signature", "self_payee", "amount_anomaly"]),
                ..metadata("atm_deposit")
            }),
        Check::new("CHECK_FRAUD003", "CLIENT003", dollars(15000.00), "Overseas Trading LLC", as_of - Duration::days(2))
            .with_check_number("5001")
            .with_amount_written("Fifteen thousand and 00/100")
            .with_memo("Investment")
            .with_bank("First National Bank")
            .with_routing(routing, "5555666677")
            .with_image_path("sample_checks/suspicious_check_003.png")
            .with_micr_line(micr(routing, "5555666677", "5001"))
            .with_metadata(CheckMetadata {
                device: Some("Rooted Android".to_string()),
                flags: flags(&["extreme_amount_anomaly", "unknown_payee", "new_account"]),
                ..metadata("mobile_deposit")
            }),
        Check::new("CHECK_FRAUD004", "CLIENT004", dollars(8750.00), "Quick Cash Services", as_of)
            .with_check_number("9001")
            .with_amount_written("Eight thousand seven hundred fifty and 00/100")
            .with_memo("")
            .with_bank("First National Bank")
            .with_routing(routing, "9999888877")
            .with_image_path("sample_checks/suspicious_check_004.png")
            .with_micr_line(micr(routing, "9999888877", "9001"))
            .with_watermark(false)
            .with_metadata(CheckMetadata {
                device: Some("Emulator".to_string()),
                flags: flags(&[
                    "missing_watermark",
                    "high_risk_client",
                    "suspicious_payee",
                    "amount_anomaly",
                    "emulator_detected",
                ]),
                ..metadata("mobile_deposit")
            }),
        Check::new("CHECK_FRAUD005", "CLIENT001", dollars(500.00), "ABC Grocery", as_of - Duration::hours(2))
            .with_check_number("1004")
            .with_amount_written("Five hundred and 00/100 DOLLARS")
            .with_memo("groceries")
            .with_bank("First National Bank")
            .with_routing(routing, "1234567890")
            .with_image_path("sample_checks/suspicious_check_005.png")
            .with_micr_line(micr(routing, "1234567890", "1004"))
            .with_metadata(CheckMetadata {
                flags: flags(&["duplicate_check_number_pattern", "altered_amount_suspected"]),
                image_quality_score: Some(0.45),
                ..metadata("mobile_deposit")
            }),
    ];

    (legitimate, fraudulent)
}

/// Every sample check, legitimate first
pub fn all_sample_checks(as_of: DateTime<Utc>) -> Vec<Check> {
    let (mut checks, fraudulent) = sample_checks(as_of);
    checks.extend(fraudulent);
    checks
}

/// Look up one sample check by id
pub fn sample_check(check_id: &str, as_of: DateTime<Utc>) -> Option<Check> {
    all_sample_checks(as_of)
        .into_iter()
        .find(|c| c.check_id == check_id)
}

/// Repository loaded with the sample clients and transactions
pub fn sample_repository(seed: u64, as_of: DateTime<Utc>) -> Repository {
    let mut repo = Repository::new();
    for client in sample_clients() {
        repo.add_client(client);
    }
    repo.add_transactions(sample_transactions(seed, as_of));
    repo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_sample_counts() {
        let (legit, fraud) = sample_checks(as_of());
        assert_eq!(legit.len(), 3);
        assert_eq!(fraud.len(), 5);
        assert_eq!(sample_clients().len(), 4);
        // 12 months × (5 + 4 + 3 + 1) templates
        assert_eq!(sample_transactions(42, as_of()).len(), 156);
    }

    #[test]
    fn test_transactions_deterministic_for_seed() {
        assert_eq!(sample_transactions(7, as_of()), sample_transactions(7, as_of()));
        assert_ne!(sample_transactions(7, as_of()), sample_transactions(8, as_of()));
    }

    #[test]
    fn test_transactions_within_jitter_band() {
        for tx in sample_transactions(3, as_of()) {
            if tx.payee == "City Rent LLC" {
                assert!(tx.amount >= 108_000 && tx.amount <= 132_000, "{}", tx.amount);
            }
            assert!(tx.date < as_of());
        }
    }

    #[test]
    fn test_sample_check_lookup() {
        let check = sample_check("CHECK_FRAUD005", as_of()).unwrap();
        assert_eq!(check.metadata.image_quality_score, Some(0.45));
        assert!(sample_check("NOPE", as_of()).is_none());
    }
}
