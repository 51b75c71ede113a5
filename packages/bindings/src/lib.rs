use napi::Result as NapiResult;
use napi_derive::napi;
use std::str::FromStr;

use loan_calc_core::options::{LoanOptions, QuoteInput};
use loan_calc_core::repayment::RepaymentInput;
use loan_calc_core::schedule::ScheduleInput;
use loan_calc_core::sensitivity::RateTermSensitivityInput;
use rust_decimal::Decimal;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| to_napi_error(format!("{field}: '{value}' is not a decimal ({e})")))
}

// ---------------------------------------------------------------------------
// Repayment
// ---------------------------------------------------------------------------

/// Never fails on bad loan figures; they come back as a zero repayment.
#[napi]
pub fn calculate_repayment(input_json: String) -> NapiResult<String> {
    let input: RepaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_calc_core::repayment::calculate_repayment(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Raw signed payment as a decimal string.
#[napi]
pub fn pmt(rate: String, nper: String, present_value: String) -> NapiResult<String> {
    let payment = loan_calc_core::time_value::pmt(
        parse_decimal("rate", &rate)?,
        parse_decimal("nper", &nper)?,
        parse_decimal("present_value", &present_value)?,
    )
    .map_err(to_napi_error)?;
    Ok(payment.to_string())
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[napi]
pub fn default_options() -> NapiResult<String> {
    serde_json::to_string(&LoanOptions::default()).map_err(to_napi_error)
}

#[napi]
pub fn quote(options_json: String, input_json: String) -> NapiResult<String> {
    let options = LoanOptions::from_json(&options_json).map_err(to_napi_error)?;
    let input: QuoteInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = options.quote(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule & sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_calc_core::schedule::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rate_term_sensitivity(input_json: String) -> NapiResult<String> {
    let input: RateTermSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_calc_core::sensitivity::evaluate_rate_term_sensitivity(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
