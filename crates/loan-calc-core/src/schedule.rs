use chrono::{Days, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::LoanCalcError;
use crate::repayment::{calculate_repayment, LoanAmount, RepaymentInput};
use crate::types::*;
use crate::LoanCalcResult;

/// Most payments a single schedule will lay out (50 years of weekly payments).
pub const MAX_SCHEDULE_ROWS: u32 = 2600;

/// Input for an amortisation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub amount: LoanAmount,
    pub term_months: u32,
    pub annual_rate: Rate,
    pub repayment_period: PaymentsPerYear,
    /// Loan drawdown date; the first payment falls one interval later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// A single payment in the schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    /// Quoted periodic payment
    pub payment: Money,
    pub periodic_rate: Rate,
    pub period_count: Decimal,
    pub rows: Vec<SchedulePeriod>,
    pub total_interest: Money,
    pub total_paid: Money,
    /// Total shown by the repayment calculator (payment x period count)
    pub quoted_total: Money,
}

/// Build a payment-by-payment amortisation schedule for the quoted payment.
///
/// Interest accrues on the opening balance each period and is rounded to
/// cents. Every row pays the quoted payment except the last, which clears
/// the remaining balance, so a fractional period count ends in a short
/// final payment.
pub fn build_schedule(input: &ScheduleInput) -> LoanCalcResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let quote = calculate_repayment(&RepaymentInput {
        amount: input.amount.clone(),
        term_months: input.term_months,
        annual_rate: input.annual_rate,
        repayment_period: input.repayment_period,
    });
    let mut warnings = quote.warnings;
    let repayment = quote.result;

    if repayment.period.is_zero() {
        return Err(LoanCalcError::InvalidInput {
            field: "amount / term_months / repayment_period".into(),
            reason: "Nothing to amortise: repayment is zero".into(),
        });
    }

    let payments = repayment
        .period_count
        .ceil()
        .to_u32()
        .ok_or_else(|| LoanCalcError::InvalidInput {
            field: "term_months".into(),
            reason: format!("{} payments is too many to schedule", repayment.period_count),
        })?;
    if payments > MAX_SCHEDULE_ROWS {
        return Err(LoanCalcError::InvalidInput {
            field: "term_months".into(),
            reason: format!(
                "{payments} payments exceeds the schedule limit of {MAX_SCHEDULE_ROWS}"
            ),
        });
    }

    let mut rows = Vec::with_capacity(payments as usize);
    let mut balance = repayment.principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;

    for number in 1..=payments {
        let opening = balance;
        let interest = to_cents(opening * repayment.periodic_rate);

        let mut payment = repayment.period;
        let mut principal = payment - interest;
        if number == payments || principal >= opening {
            principal = opening;
            payment = opening + interest;
        }
        balance = opening - principal;

        let due_date = match input.start_date {
            Some(d) => Some(due_date(d, input.repayment_period, number)?),
            None => None,
        };

        total_interest += interest;
        total_paid += payment;
        rows.push(SchedulePeriod {
            number,
            due_date,
            opening_balance: opening,
            payment,
            interest,
            principal,
            closing_balance: balance,
        });

        if balance.is_zero() && number < payments {
            warnings.push(format!(
                "Loan is repaid after {number} of {payments} scheduled payments"
            ));
            break;
        }
    }

    if (total_paid - repayment.total).abs() > repayment.period {
        warnings.push(format!(
            "Scheduled total {total_paid} differs from quoted total {} by more than one payment",
            repayment.total
        ));
    }
    debug!(rows = rows.len(), %total_interest, "schedule built");

    let output = ScheduleOutput {
        payment: repayment.period,
        periodic_rate: repayment.periodic_rate,
        period_count: repayment.period_count,
        rows,
        total_interest,
        total_paid,
        quoted_total: repayment.total,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortisation schedule at the quoted payment",
        &serde_json::json!({
            "principal": repayment.principal.to_string(),
            "annual_rate": input.annual_rate.to_string(),
            "repayment_period": input.repayment_period,
            "term_months": input.term_months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn to_cents(v: Money) -> Money {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Due date of payment `number`.
///
/// Frequencies that divide a year into whole months step by calendar month;
/// others step by `365 / frequency` days (7 for weekly, 14 for fortnightly).
fn due_date(start: NaiveDate, repayment_period: PaymentsPerYear, number: u32) -> LoanCalcResult<NaiveDate> {
    let date = if MONTHS_PER_YEAR % repayment_period == 0 {
        let step = MONTHS_PER_YEAR / repayment_period;
        start.checked_add_months(Months::new(step * number))
    } else {
        let step = (365 / repayment_period).max(1);
        start.checked_add_days(Days::new(u64::from(step) * u64::from(number)))
    };
    date.ok_or_else(|| {
        LoanCalcError::DateError(format!("Payment {number} after {start} is out of range"))
    })
}
