use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use loan_calc_core::repayment::LoanAmount;
use loan_calc_core::sensitivity::{self, RateTermSensitivityInput, SensitivityMetric};
use loan_calc_core::types::{PaymentsPerYear, SensitivityVariable};

use super::parse_frequency;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Period,
    Total,
}

/// Arguments for a rate x term sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Loan amount; currency formatting is ignored
    #[arg(long)]
    pub amount: Option<String>,

    /// weekly, fortnightly, monthly, or payments per year
    #[arg(long, default_value = "monthly", value_parser = parse_frequency)]
    pub frequency: PaymentsPerYear,

    #[arg(long, default_value = "0.02")]
    pub rate_min: Decimal,

    #[arg(long, default_value = "0.12")]
    pub rate_max: Decimal,

    #[arg(long, default_value = "0.02")]
    pub rate_step: Decimal,

    /// Shortest term in months
    #[arg(long, default_value = "12")]
    pub term_min: Decimal,

    /// Longest term in months
    #[arg(long, default_value = "60")]
    pub term_max: Decimal,

    #[arg(long, default_value = "12")]
    pub term_step: Decimal,

    /// Figure shown in each cell
    #[arg(long, value_enum, default_value = "period")]
    pub metric: MetricArg,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: RateTermSensitivityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RateTermSensitivityInput {
            amount: args
                .amount
                .map(LoanAmount::from)
                .ok_or("--amount is required (or provide --input)")?,
            repayment_period: args.frequency,
            rate: SensitivityVariable {
                name: "annual_rate".into(),
                min: args.rate_min,
                max: args.rate_max,
                step: args.rate_step,
            },
            term: SensitivityVariable {
                name: "term_months".into(),
                min: args.term_min,
                max: args.term_max,
                step: args.term_step,
            },
            metric: match args.metric {
                MetricArg::Period => SensitivityMetric::Period,
                MetricArg::Total => SensitivityMetric::Total,
            },
        }
    };

    if sens_input.rate.step > dec!(1) {
        tracing::warn!(step = %sens_input.rate.step, "rate step above 100%; rates are decimals, not percentages");
    }

    let result = sensitivity::evaluate_rate_term_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
