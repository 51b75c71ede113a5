use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use loan_calc_core::options::LoanOptions;
use loan_calc_core::schedule::{self, ScheduleInput};

use super::repayment::LoanArgs;
use crate::input;

/// Arguments for an amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Drawdown date (YYYY-MM-DD); adds a due date to every payment
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_schedule(args: ScheduleArgs, options: &LoanOptions) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.loan.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleInput {
            amount: args.loan.amount()?,
            term_months: args.loan.term_months()?,
            annual_rate: args.loan.annual_rate(options)?,
            repayment_period: args.loan.frequency,
            start_date: args.start_date,
        }
    };

    let result = schedule::build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
