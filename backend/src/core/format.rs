//! Text formatting helpers shared by analyzers and notes

/// Dollar amount with thousands separators and two decimals
///
/// # Example
/// ```
/// use check_fraud_core_rs::core::format::format_dollars;
///
/// assert_eq!(format_dollars(1234567.891), "1,234,567.89");
/// assert_eq!(format_dollars(-50.0), "-50.00");
/// ```
pub fn format_dollars(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Ratio as a percentage with one decimal (`0.853` → `85.3%`)
pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dollars() {
        assert_eq!(format_dollars(0.0), "0.00");
        assert_eq!(format_dollars(999.5), "999.50");
        assert_eq!(format_dollars(1000.0), "1,000.00");
        assert_eq!(format_dollars(15000.0), "15,000.00");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.853), "85.3%");
    }
}
