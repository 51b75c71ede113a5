use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LoanCalcError;
use crate::types::{Money, Rate};
use crate::LoanCalcResult;

/// Payment (PMT) that fully amortises `present_value` over `nper` periods
/// at `rate` per period, with zero future value.
///
/// Standard case: pmt = -(pv * r) / (1 - (1 + r)^-n)
/// Zero rate:     pmt = -pv / n
///
/// `nper` may be fractional; the exponent is evaluated as-is. The result
/// follows the cash-flow sign convention, so a positive principal yields a
/// negative payment. No domain validation is done here beyond refusing the
/// inputs that have no numeric answer.
pub fn pmt(rate: Rate, nper: Decimal, present_value: Money) -> LoanCalcResult<Money> {
    if nper.is_zero() {
        return Err(LoanCalcError::DivisionByZero {
            context: "PMT period count".into(),
        });
    }
    if rate <= dec!(-1) {
        return Err(LoanCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }

    if rate.is_zero() {
        return straight_line(nper, present_value);
    }

    let factor = compound_factor(rate, nper)?;
    let discount = Decimal::ONE
        - Decimal::ONE
            .checked_div(factor)
            .ok_or_else(|| LoanCalcError::DivisionByZero {
                context: "PMT discount factor".into(),
            })?;

    // Rates small enough to vanish in 28 significant digits behave like zero.
    if discount.is_zero() {
        return straight_line(nper, present_value);
    }

    let interest = present_value
        .checked_mul(rate)
        .ok_or_else(|| LoanCalcError::InvalidInput {
            field: "present_value".into(),
            reason: "Principal x rate exceeds decimal range".into(),
        })?;

    interest
        .checked_div(discount)
        .map(|p| -p)
        .ok_or_else(|| LoanCalcError::DivisionByZero {
            context: "PMT annuity factor".into(),
        })
}

/// (1 + r)^n, with negative `n` handled as the reciprocal.
fn compound_factor(rate: Rate, nper: Decimal) -> LoanCalcResult<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    let grown = one_plus_r
        .checked_powd(nper.abs())
        .ok_or_else(|| LoanCalcError::DivisionByZero {
            context: "PMT compound factor".into(),
        })?;

    if nper.is_sign_negative() {
        Decimal::ONE
            .checked_div(grown)
            .ok_or_else(|| LoanCalcError::DivisionByZero {
                context: "PMT compound factor".into(),
            })
    } else {
        Ok(grown)
    }
}

fn straight_line(nper: Decimal, present_value: Money) -> LoanCalcResult<Money> {
    present_value
        .checked_div(nper)
        .map(|p| -p)
        .ok_or_else(|| LoanCalcError::DivisionByZero {
            context: "PMT period count".into(),
        })
}
