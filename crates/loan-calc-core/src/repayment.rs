use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, trace};

use crate::error::LoanCalcError;
use crate::time_value::pmt;
use crate::types::{with_metadata, ComputationOutput, Money, PaymentsPerYear, Rate, MONTHS_PER_YEAR};

/// Principal as supplied by the caller: either a number or free-form text
/// such as `"$30,000"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoanAmount {
    Value(Money),
    Text(String),
}

impl LoanAmount {
    /// Numeric value, or `None` when text holds no usable number.
    ///
    /// Text keeps only ASCII digits and `.`, then reads the longest leading
    /// number (so `"1.2.3"` reads as `1.2`).
    pub fn parse(&self) -> Option<Money> {
        match self {
            LoanAmount::Value(v) => Some(*v),
            LoanAmount::Text(raw) => parse_amount_text(raw),
        }
    }

    /// Sanitised principal; unusable text is zero.
    pub fn sanitize(&self) -> Money {
        self.parse().unwrap_or(Decimal::ZERO)
    }
}

impl Default for LoanAmount {
    fn default() -> Self {
        LoanAmount::Value(Decimal::ZERO)
    }
}

impl From<Decimal> for LoanAmount {
    fn from(v: Decimal) -> Self {
        LoanAmount::Value(v)
    }
}

impl From<u32> for LoanAmount {
    fn from(v: u32) -> Self {
        LoanAmount::Value(Decimal::from(v))
    }
}

impl From<u64> for LoanAmount {
    fn from(v: u64) -> Self {
        LoanAmount::Value(Decimal::from(v))
    }
}

impl From<i64> for LoanAmount {
    fn from(v: i64) -> Self {
        LoanAmount::Value(Decimal::from(v))
    }
}

impl From<&str> for LoanAmount {
    fn from(v: &str) -> Self {
        LoanAmount::Text(v.to_string())
    }
}

impl From<String> for LoanAmount {
    fn from(v: String) -> Self {
        LoanAmount::Text(v)
    }
}

fn parse_amount_text(raw: &str) -> Option<Money> {
    let mut seen_point = false;
    let numeric: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .take_while(|c| {
            if *c == '.' {
                if seen_point {
                    return false;
                }
                seen_point = true;
            }
            true
        })
        .collect();

    let numeric = numeric.trim_end_matches('.');
    if !numeric.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if numeric.starts_with('.') {
        Decimal::from_str(&format!("0{numeric}")).ok()
    } else {
        Decimal::from_str(numeric).ok()
    }
}

/// Rounded periodic payment and the total repaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentResult {
    /// Per-payment amount rounded to whole currency units
    pub period: Money,
    /// `period` x number of payments
    pub total: Money,
}

impl RepaymentResult {
    pub const ZERO: RepaymentResult = RepaymentResult {
        period: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        self.period.is_zero() && self.total.is_zero()
    }
}

/// Inputs for an enveloped repayment calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentInput {
    /// Principal, numeric or formatted text
    pub amount: LoanAmount,
    /// Loan term in months
    pub term_months: u32,
    /// Annual interest rate as a decimal
    pub annual_rate: Rate,
    /// Payments per year (12 monthly, 26 fortnightly, 52 weekly)
    pub repayment_period: PaymentsPerYear,
}

/// Repayment figures plus the intermediates behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentOutput {
    pub period: Money,
    pub total: Money,
    /// Sanitised principal
    pub principal: Money,
    /// Scheduled payments over the term, possibly fractional
    pub period_count: Decimal,
    /// Annual rate / payments per year
    pub periodic_rate: Rate,
    /// total - principal
    pub total_interest: Money,
}

impl RepaymentOutput {
    fn zero(principal: Money) -> Self {
        RepaymentOutput {
            period: Decimal::ZERO,
            total: Decimal::ZERO,
            principal,
            period_count: Decimal::ZERO,
            periodic_rate: Decimal::ZERO,
            total_interest: Decimal::ZERO,
        }
    }

    pub fn result(&self) -> RepaymentResult {
        RepaymentResult {
            period: self.period,
            total: self.total,
        }
    }
}

/// Number of scheduled payments: (term_months / 12) x payments per year.
///
/// Multiplied before dividing so whole counts stay exact.
pub fn period_count(term_months: u32, repayment_period: PaymentsPerYear) -> Decimal {
    (Decimal::from(term_months) * Decimal::from(repayment_period)
        / Decimal::from(MONTHS_PER_YEAR))
    .normalize()
}

/// Periodic payment and total repaid for a loan.
///
/// A zero amount (after sanitising text), term or frequency gives the zero
/// result, as does any input the payment formula cannot evaluate. The
/// payment is rounded half-up to whole units and the total is derived from
/// that rounded payment, so `total == period * period_count` always holds.
pub fn calculate(
    amount: impl Into<LoanAmount>,
    term_months: u32,
    annual_rate: Rate,
    repayment_period: PaymentsPerYear,
) -> RepaymentResult {
    let principal = amount.into().sanitize();
    match compute(principal, term_months, annual_rate, repayment_period) {
        Ok(out) => out.result(),
        Err(absorbed) => {
            debug!(%principal, term_months, %annual_rate, repayment_period, reason = %absorbed, "zero repayment");
            RepaymentResult::ZERO
        }
    }
}

/// Enveloped form of [`calculate`] with intermediates and warnings.
pub fn calculate_repayment(input: &RepaymentInput) -> ComputationOutput<RepaymentOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = match input.amount.parse() {
        Some(v) => v,
        None => {
            if let LoanAmount::Text(raw) = &input.amount {
                warnings.push(format!(
                    "Loan amount '{raw}' contains no usable number; treated as 0"
                ));
            }
            Decimal::ZERO
        }
    };

    if input.annual_rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative annual rate ({}); payments fall below principal / periods",
            input.annual_rate
        ));
    }

    let output = match compute(
        principal,
        input.term_months,
        input.annual_rate,
        input.repayment_period,
    ) {
        Ok(out) => {
            if out.period_count.fract() != Decimal::ZERO {
                warnings.push(format!(
                    "Period count {} is fractional; payment approximates a schedule that cannot be paid exactly",
                    out.period_count.round_dp(4)
                ));
            }
            out
        }
        Err(absorbed) => {
            debug!(reason = %absorbed, "zero repayment");
            warnings.push(format!("{absorbed}; result is zero"));
            RepaymentOutput::zero(principal)
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Amortised payment (PMT), rounded half-up to whole units",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Why a calculation produced the zero result.
#[derive(Debug)]
enum Absorbed {
    Guard(&'static str),
    Formula(LoanCalcError),
    Overflow,
}

impl std::fmt::Display for Absorbed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Absorbed::Guard(field) => write!(f, "{field} is zero"),
            Absorbed::Formula(e) => write!(f, "payment formula failed ({e})"),
            Absorbed::Overflow => write!(f, "total exceeds decimal range"),
        }
    }
}

fn compute(
    principal: Money,
    term_months: u32,
    annual_rate: Rate,
    repayment_period: PaymentsPerYear,
) -> Result<RepaymentOutput, Absorbed> {
    if repayment_period == 0 {
        return Err(Absorbed::Guard("Repayment period"));
    }
    if term_months == 0 {
        return Err(Absorbed::Guard("Term"));
    }
    if principal <= Decimal::ZERO {
        return Err(Absorbed::Guard("Loan amount"));
    }

    let count = period_count(term_months, repayment_period);
    let periodic_rate = annual_rate / Decimal::from(repayment_period);
    let raw = pmt(periodic_rate, count, principal).map_err(Absorbed::Formula)?;
    trace!(%count, %periodic_rate, %raw, "payment formula");

    let period = round_half_up(raw.abs());
    let total = period
        .checked_mul(count)
        .ok_or(Absorbed::Overflow)?
        .normalize();

    Ok(RepaymentOutput {
        period,
        total,
        principal,
        period_count: count,
        periodic_rate,
        total_interest: total - principal,
    })
}

/// Decimal places kept before rounding to whole units. The periodic rate is
/// truncated at 28 digits, which can leave an exact `.5` payment as
/// `.4999...`; settling it here first restores the midpoint.
const SETTLE_DP: u32 = 12;

fn round_half_up(payment: Money) -> Money {
    payment
        .round_dp_with_strategy(SETTLE_DP, RoundingStrategy::MidpointAwayFromZero)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FORTNIGHTLY, MONTHLY, WEEKLY};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sanitize_currency_text() {
        assert_eq!(LoanAmount::from("$30,000").sanitize(), dec!(30000));
        assert_eq!(LoanAmount::from("  12,500.50 AUD").sanitize(), dec!(12500.50));
    }

    #[test]
    fn test_sanitize_reads_leading_number_only() {
        assert_eq!(LoanAmount::from("1.2.3").sanitize(), dec!(1.2));
        assert_eq!(LoanAmount::from(".5").sanitize(), dec!(0.5));
        assert_eq!(LoanAmount::from("7.").sanitize(), dec!(7));
    }

    #[test]
    fn test_sanitize_drops_sign() {
        assert_eq!(LoanAmount::from("-2,000").sanitize(), dec!(2000));
    }

    #[test]
    fn test_unusable_text_is_zero() {
        assert_eq!(LoanAmount::from("").parse(), None);
        assert_eq!(LoanAmount::from("abc").parse(), None);
        assert_eq!(LoanAmount::from("$.").sanitize(), Decimal::ZERO);
    }

    #[test]
    fn test_period_count() {
        assert_eq!(period_count(24, MONTHLY), dec!(24));
        assert_eq!(period_count(6, FORTNIGHTLY), dec!(13));
        assert_eq!(period_count(24, WEEKLY), dec!(104));
        assert_eq!(period_count(1, MONTHLY), dec!(1));
    }

    #[test]
    fn test_calculate_reference_loan() {
        let result = calculate(30000u32, 24, dec!(0.10), MONTHLY);
        assert_eq!(
            result,
            RepaymentResult {
                period: dec!(1384),
                total: dec!(33216),
            }
        );
    }

    #[test]
    fn test_round_half_up_settles_truncated_midpoint() {
        assert_eq!(round_half_up(dec!(27353.499999999999999999999817)), dec!(27354));
        assert_eq!(round_half_up(dec!(27353.4999)), dec!(27353));
        assert_eq!(round_half_up(dec!(12.5)), dec!(13));
    }

    #[test]
    fn test_negative_amount_is_zero_result() {
        let result = calculate(dec!(-5000), 24, dec!(0.10), MONTHLY);
        assert_eq!(result, RepaymentResult::ZERO);
    }

    #[test]
    fn test_unevaluable_rate_absorbed() {
        // Periodic rate of -100% has no payment; zero result instead of an error
        let result = calculate(10000u32, 12, dec!(-12), MONTHLY);
        assert!(result.is_zero());
    }

    #[test]
    fn test_envelope_reports_unparseable_text() {
        let input = RepaymentInput {
            amount: LoanAmount::from("n/a"),
            term_months: 24,
            annual_rate: dec!(0.10),
            repayment_period: MONTHLY,
        };
        let out = calculate_repayment(&input);
        assert!(out.result.result().is_zero());
        assert!(out.warnings.iter().any(|w| w.contains("no usable number")));
    }

    #[test]
    fn test_envelope_flags_fractional_period_count() {
        let input = RepaymentInput {
            amount: LoanAmount::from(30000u32),
            term_months: 7,
            annual_rate: dec!(0.10),
            repayment_period: FORTNIGHTLY,
        };
        let out = calculate_repayment(&input);
        assert_eq!(out.result.period, dec!(2040));
        assert!(out.warnings.iter().any(|w| w.contains("fractional")));
    }

    #[test]
    fn test_envelope_total_interest() {
        let input = RepaymentInput {
            amount: LoanAmount::from("$30,000"),
            term_months: 24,
            annual_rate: dec!(0.10),
            repayment_period: MONTHLY,
        };
        let out = calculate_repayment(&input).result;
        assert_eq!(out.principal, dec!(30000));
        assert_eq!(out.total_interest, dec!(3216));
    }
}
