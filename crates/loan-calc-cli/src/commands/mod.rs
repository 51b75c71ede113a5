pub mod repayment;
pub mod schedule;
pub mod sensitivity;

use loan_calc_core::types::{PaymentsPerYear, FORTNIGHTLY, MONTHLY, WEEKLY};

/// Parse a repayment frequency name or a payments-per-year count.
pub fn parse_frequency(s: &str) -> Result<PaymentsPerYear, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "weekly" => Ok(WEEKLY),
        "fortnightly" | "biweekly" => Ok(FORTNIGHTLY),
        "monthly" => Ok(MONTHLY),
        other => other.parse::<PaymentsPerYear>().map_err(|_| {
            format!("'{s}' is not a frequency (weekly, fortnightly, monthly or payments per year)")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frequency_names() {
        assert_eq!(parse_frequency("Weekly"), Ok(52));
        assert_eq!(parse_frequency("fortnightly"), Ok(26));
        assert_eq!(parse_frequency(" monthly "), Ok(12));
    }

    #[test]
    fn test_parse_frequency_counts() {
        assert_eq!(parse_frequency("4"), Ok(4));
        assert_eq!(parse_frequency("0"), Ok(0));
        assert!(parse_frequency("daily").is_err());
        assert!(parse_frequency("-12").is_err());
    }
}
