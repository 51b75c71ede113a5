use loan_calc_core::options::{LoanOptions, QuoteInput};
use loan_calc_core::repayment::{self, period_count, LoanAmount, RepaymentInput, RepaymentResult};
use loan_calc_core::time_value::pmt;
use loan_calc_core::types::{FORTNIGHTLY, MONTHLY, WEEKLY};
use pretty_assertions::assert_eq;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

// ===========================================================================
// Reference loans (monthly)
// ===========================================================================

#[test]
fn test_working_capital_loan() {
    // $30k at 10% over 2 years ≈ $1,384/month, $33,216 total
    let result = repayment::calculate(30000u32, 24, dec!(0.10), MONTHLY);
    assert_eq!(result.period, dec!(1384));
    assert_eq!(result.total, dec!(33216));
}

#[test]
fn test_vehicle_loan() {
    let result = repayment::calculate(50000u32, 60, dec!(0.045), MONTHLY);
    assert_eq!(result.period, dec!(932));
    assert_eq!(result.total, dec!(932) * dec!(60));
}

#[test]
fn test_property_loan() {
    let result = repayment::calculate(200000u32, 240, dec!(0.029), MONTHLY);
    assert_eq!(result.period, dec!(1099));
}

#[test]
fn test_formatted_text_matches_number() {
    let from_text = repayment::calculate("$30,000", 24, dec!(0.10), MONTHLY);
    let from_number = repayment::calculate(30000u32, 24, dec!(0.10), MONTHLY);
    assert_eq!(from_text, from_number);
}

#[test]
fn test_raw_formula_reference() {
    let raw = pmt(dec!(0.10) / dec!(12), dec!(24), dec!(30000)).unwrap();
    assert_eq!(raw.trunc(), dec!(-1384));
}

// ===========================================================================
// Period counts and totals
// ===========================================================================

#[test]
fn test_fortnightly_six_months_is_thirteen_payments() {
    let result = repayment::calculate(10000u32, 6, dec!(0.10), FORTNIGHTLY);
    assert_eq!(period_count(6, FORTNIGHTLY), dec!(13));
    assert_eq!(result.total, result.period * dec!(13));
}

#[test]
fn test_weekly_two_years_is_104_payments() {
    let result = repayment::calculate(10000u32, 24, dec!(0.10), WEEKLY);
    assert_eq!(result.total, result.period * dec!(104));
}

#[test]
fn test_total_is_period_times_count() {
    let cases = [
        (12u32, MONTHLY),
        (18, FORTNIGHTLY),
        (7, WEEKLY),
        (7, FORTNIGHTLY),
        (60, MONTHLY),
    ];
    for (term, freq) in cases {
        let result = repayment::calculate(25000u32, term, dec!(0.085), freq);
        assert_eq!(
            result.total,
            result.period * period_count(term, freq),
            "term {term}, frequency {freq}"
        );
    }
}

#[test]
fn test_period_is_whole_units() {
    let result = repayment::calculate(12345u32, 17, dec!(0.073), FORTNIGHTLY);
    assert_eq!(result.period.fract(), Decimal::ZERO);
}

// ===========================================================================
// Zero guards
// ===========================================================================

#[test]
fn test_zero_inputs_give_zero_result() {
    assert_eq!(repayment::calculate(0u32, 24, dec!(0.10), MONTHLY), RepaymentResult::ZERO);
    assert_eq!(repayment::calculate(30000u32, 0, dec!(0.10), MONTHLY), RepaymentResult::ZERO);
    assert_eq!(repayment::calculate(30000u32, 24, dec!(0.10), 0), RepaymentResult::ZERO);
    assert_eq!(repayment::calculate("", 24, dec!(0.10), MONTHLY), RepaymentResult::ZERO);
    assert_eq!(repayment::calculate("$", 24, dec!(0.10), MONTHLY), RepaymentResult::ZERO);
}

// ===========================================================================
// Monotonicity and degenerate rate
// ===========================================================================

#[test]
fn test_period_strictly_increases_with_rate() {
    let rates = [dec!(0.0), dec!(0.02), dec!(0.05), dec!(0.10), dec!(0.20)];
    let periods: Vec<Decimal> = rates
        .iter()
        .map(|r| repayment::calculate(100000u32, 60, *r, MONTHLY).period)
        .collect();
    for pair in periods.windows(2) {
        assert!(pair[0] < pair[1], "{periods:?}");
    }
}

#[test]
fn test_longer_term_lowers_period_raises_total() {
    let terms = [6u32, 12, 24, 60, 120];
    let results: Vec<RepaymentResult> = terms
        .iter()
        .map(|t| repayment::calculate(50000u32, *t, dec!(0.08), MONTHLY))
        .collect();
    for pair in results.windows(2) {
        assert!(pair[0].period > pair[1].period);
        assert!(pair[0].total < pair[1].total);
    }
}

#[test]
fn test_zero_rate_divides_evenly() {
    let result = repayment::calculate(30000u32, 24, Decimal::ZERO, MONTHLY);
    assert_eq!(result.period, dec!(1250));
    assert_eq!(result.total, dec!(30000));

    let odd = repayment::calculate(10000u32, 7, Decimal::ZERO, FORTNIGHTLY);
    let expected = (dec!(10000) / period_count(7, FORTNIGHTLY))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    assert_eq!(odd.period, expected);
}

// ===========================================================================
// Rounding at exact midpoints
// ===========================================================================

#[test]
fn test_exact_half_payment_rounds_up() {
    // One payment of 27240 * (1 + 0.05/12) = 27353.50
    let result = repayment::calculate(27240u32, 1, dec!(0.05), MONTHLY);
    assert_eq!(result.period, dec!(27354));
    assert_eq!(result.total, dec!(27354));

    // 67350 * (1 + 0.2/12) = 68472.50
    let result = repayment::calculate(67350u32, 1, dec!(0.2), MONTHLY);
    assert_eq!(result.period, dec!(68473));
}

#[test]
fn test_zero_rate_midpoint_rounds_up() {
    // 25 over 2 monthly payments = 12.5 each
    let result = repayment::calculate(25u32, 2, Decimal::ZERO, MONTHLY);
    assert_eq!(result.period, dec!(13));
    assert_eq!(result.total, dec!(26));
}

// ===========================================================================
// Envelope and quoting
// ===========================================================================

#[test]
fn test_envelope_matches_plain_calculation() {
    let input = RepaymentInput {
        amount: LoanAmount::from("30,000"),
        term_months: 24,
        annual_rate: dec!(0.10),
        repayment_period: MONTHLY,
    };
    let out = repayment::calculate_repayment(&input);
    assert_eq!(out.result.result(), repayment::calculate(30000u32, 24, dec!(0.10), MONTHLY));
    assert_eq!(out.result.period_count, dec!(24));
    assert!(out.warnings.is_empty());
}

#[test]
fn test_envelope_deserializes_text_or_number_amount() {
    let text: RepaymentInput = serde_json::from_str(
        r#"{"amount": "$30,000", "term_months": 24, "annual_rate": "0.10", "repayment_period": 12}"#,
    )
    .unwrap();
    let number: RepaymentInput = serde_json::from_str(
        r#"{"amount": 30000, "term_months": 24, "annual_rate": 0.10, "repayment_period": 12}"#,
    )
    .unwrap();
    assert_eq!(text.amount.sanitize(), number.amount.sanitize());
    assert_eq!(
        repayment::calculate_repayment(&text).result.result(),
        repayment::calculate_repayment(&number).result.result()
    );
}

#[test]
fn test_zero_guard_warning() {
    let input = RepaymentInput {
        amount: LoanAmount::from(30000u32),
        term_months: 0,
        annual_rate: dec!(0.10),
        repayment_period: MONTHLY,
    };
    let out = repayment::calculate_repayment(&input);
    assert!(out.result.result().is_zero());
    assert_eq!(out.warnings, vec!["Term is zero; result is zero".to_string()]);
}

#[test]
fn test_quote_property_purpose() {
    let out = LoanOptions::default()
        .quote(&QuoteInput {
            amount: LoanAmount::from("200000"),
            purpose: "property".into(),
            repayment_period: MONTHLY,
            term_months: 240,
        })
        .unwrap();
    assert_eq!(out.result.period, dec!(1099));
    assert_eq!(out.result.total, dec!(1099) * dec!(240));
}
