use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use loan_calc_core::options::{LoanOptions, QuoteInput};
use loan_calc_core::repayment::{self, LoanAmount, RepaymentInput, RepaymentOutput};
use loan_calc_core::time_value;
use loan_calc_core::types::{with_metadata, ComputationOutput, PaymentsPerYear, Rate};

use super::parse_frequency;
use crate::input;

/// Loan parameters shared by the repayment and schedule commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
    /// Loan amount; currency formatting is ignored (e.g. "$30,000")
    #[arg(long)]
    pub amount: Option<String>,

    /// Loan term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Annual interest rate (e.g. 0.10 for 10%)
    #[arg(long, conflicts_with = "purpose")]
    pub rate: Option<Decimal>,

    /// Loan purpose key; its annual rate comes from the options table
    #[arg(long)]
    pub purpose: Option<String>,

    /// weekly, fortnightly, monthly, or payments per year
    #[arg(long, default_value = "monthly", value_parser = parse_frequency)]
    pub frequency: PaymentsPerYear,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the raw payment formula
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PmtArgs {
    /// Periodic interest rate (annual rate / payments per year)
    #[arg(long)]
    pub rate: Decimal,

    /// Number of periods; may be fractional
    #[arg(long)]
    pub nper: Decimal,

    /// Present value (principal)
    #[arg(long)]
    pub present_value: Decimal,
}

/// A repayment request from a file or stdin, by explicit rate or by purpose.
#[derive(Debug)]
enum RepaymentRequest {
    Rate(RepaymentInput),
    Purpose(QuoteInput),
}

impl RepaymentRequest {
    /// `annual_rate` selects an explicit-rate request, `purpose` a quote.
    /// Supplying both is rejected rather than silently preferring one.
    fn from_value(data: Value) -> Result<Self, Box<dyn std::error::Error>> {
        let has_rate = data.get("annual_rate").is_some();
        let has_purpose = data.get("purpose").is_some();
        match (has_rate, has_purpose) {
            (true, true) => Err("request has both 'annual_rate' and 'purpose'; give one".into()),
            (false, true) => Ok(RepaymentRequest::Purpose(serde_json::from_value(data)?)),
            _ => Ok(RepaymentRequest::Rate(serde_json::from_value(data)?)),
        }
    }
}

impl LoanArgs {
    pub fn amount(&self) -> Result<LoanAmount, Box<dyn std::error::Error>> {
        self.amount
            .clone()
            .map(LoanAmount::from)
            .ok_or_else(|| "--amount is required (or provide --input)".into())
    }

    pub fn term_months(&self) -> Result<u32, Box<dyn std::error::Error>> {
        self.term_months
            .ok_or_else(|| "--term-months is required (or provide --input)".into())
    }

    /// Explicit `--rate`, else the rate of `--purpose`, else the first
    /// purpose in the options table.
    pub fn annual_rate(&self, options: &LoanOptions) -> Result<Rate, Box<dyn std::error::Error>> {
        if let Some(rate) = self.rate {
            return Ok(rate);
        }
        let key = match &self.purpose {
            Some(key) => key.as_str(),
            None => options
                .purposes
                .first()
                .map(|p| p.value.as_str())
                .ok_or("no loan purposes configured")?,
        };
        debug!(purpose = key, "resolving rate from purpose");
        Ok(options.rate_for(key)?)
    }
}

pub fn run_repayment(args: LoanArgs, options: &LoanOptions) -> Result<Value, Box<dyn std::error::Error>> {
    let data: Option<Value> = if let Some(ref path) = args.input {
        Some(input::file::read_json(path)?)
    } else {
        input::stdin::read_stdin()?
    };
    let output = resolve_repayment(&args, data, options)?;
    Ok(serde_json::to_value(output)?)
}

/// A file or stdin request wins over flags. Among flags, `--rate` wins over
/// `--purpose`, which wins over the first configured purpose.
fn resolve_repayment(
    args: &LoanArgs,
    data: Option<Value>,
    options: &LoanOptions,
) -> Result<ComputationOutput<RepaymentOutput>, Box<dyn std::error::Error>> {
    let request = data.map(RepaymentRequest::from_value).transpose()?;
    let output = match request {
        Some(RepaymentRequest::Rate(input)) => repayment::calculate_repayment(&input),
        Some(RepaymentRequest::Purpose(quote)) => options.quote(&quote)?,
        None => match (&args.rate, &args.purpose) {
            (None, Some(purpose)) => options.quote(&QuoteInput {
                amount: args.amount()?,
                purpose: purpose.clone(),
                repayment_period: args.frequency,
                term_months: args.term_months()?,
            })?,
            _ => repayment::calculate_repayment(&RepaymentInput {
                amount: args.amount()?,
                term_months: args.term_months()?,
                annual_rate: args.annual_rate(options)?,
                repayment_period: args.frequency,
            }),
        },
    };
    Ok(output)
}

pub fn run_pmt(args: PmtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let payment = time_value::pmt(args.rate, args.nper, args.present_value)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "PMT: -(pv * r) / (1 - (1 + r)^-n), or -pv / n at r = 0",
        &serde_json::json!({
            "rate": args.rate.to_string(),
            "nper": args.nper.to_string(),
            "present_value": args.present_value.to_string(),
        }),
        Vec::new(),
        elapsed,
        serde_json::json!({ "payment": payment.to_string() }),
    );
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_calc_core::types::MONTHLY;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn flags() -> LoanArgs {
        LoanArgs {
            amount: Some("$30,000".into()),
            term_months: Some(24),
            rate: None,
            purpose: None,
            frequency: MONTHLY,
            input: None,
        }
    }

    #[test]
    fn test_default_purpose_is_first_configured() {
        let options = LoanOptions::default();
        let out = resolve_repayment(&flags(), None, &options).unwrap();
        // First default purpose is 10%
        assert_eq!(out.result.periodic_rate, dec!(0.10) / dec!(12));
        assert_eq!(out.result.period, dec!(1384));
    }

    #[test]
    fn test_purpose_flag_selects_rate() {
        let mut args = flags();
        args.amount = Some("200000".into());
        args.term_months = Some(240);
        args.purpose = Some("property".into());
        let out = resolve_repayment(&args, None, &LoanOptions::default()).unwrap();
        assert_eq!(out.result.period, dec!(1099));
    }

    #[test]
    fn test_rate_flag_used_directly() {
        let mut args = flags();
        args.rate = Some(Decimal::ZERO);
        let out = resolve_repayment(&args, None, &LoanOptions::default()).unwrap();
        assert_eq!(out.result.period, dec!(1250));
    }

    #[test]
    fn test_unknown_purpose_is_error() {
        let mut args = flags();
        args.purpose = Some("yacht".into());
        assert!(resolve_repayment(&args, None, &LoanOptions::default()).is_err());
    }

    #[test]
    fn test_missing_amount_is_error() {
        let mut args = flags();
        args.amount = None;
        assert!(resolve_repayment(&args, None, &LoanOptions::default()).is_err());
    }

    #[test]
    fn test_request_overrides_flags() {
        let mut args = flags();
        args.rate = Some(dec!(0.5));
        let data = json!({
            "amount": 50000,
            "term_months": 60,
            "annual_rate": "0.045",
            "repayment_period": 12
        });
        let out = resolve_repayment(&args, Some(data), &LoanOptions::default()).unwrap();
        assert_eq!(out.result.period, dec!(932));
    }

    #[test]
    fn test_purpose_request_is_quoted() {
        let data = json!({
            "amount": "200,000",
            "purpose": "property",
            "term_months": 240,
            "repayment_period": 12
        });
        let out = resolve_repayment(&flags(), Some(data), &LoanOptions::default()).unwrap();
        assert_eq!(out.result.period, dec!(1099));
    }

    #[test]
    fn test_request_with_rate_and_purpose_rejected() {
        let data = json!({
            "amount": 30000,
            "annual_rate": 0.10,
            "purpose": "vehicle",
            "term_months": 24,
            "repayment_period": 12
        });
        let err = resolve_repayment(&flags(), Some(data), &LoanOptions::default()).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_input_file_is_read() {
        let path = std::env::temp_dir().join(format!("loanc-request-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"amount": "$30,000", "term_months": 24, "annual_rate": "0.10", "repayment_period": 12}"#,
        )
        .unwrap();

        let mut args = flags();
        args.amount = None;
        args.input = Some(path.to_string_lossy().into_owned());
        let value = run_repayment(args, &LoanOptions::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(value["result"]["period"], json!("1384"));
    }
}
