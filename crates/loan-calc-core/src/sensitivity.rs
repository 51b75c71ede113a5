use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanCalcError;
use crate::repayment::{calculate, LoanAmount};
use crate::types::*;
use crate::LoanCalcResult;

/// Which repayment figure fills the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    #[default]
    Period,
    Total,
}

/// Input for a rate x term sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTermSensitivityInput {
    pub amount: LoanAmount,
    pub repayment_period: PaymentsPerYear,
    /// Annual rate sweep (rows)
    pub rate: SensitivityVariable,
    /// Term sweep in whole months (columns)
    pub term: SensitivityVariable,
    #[serde(default)]
    pub metric: SensitivityMetric,
}

/// Output of a 2-way sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: SensitivityMetric,
    /// Matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Money>>,
    /// Base case output value
    pub base_case_value: Money,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Most values a single sweep may produce.
pub const MAX_SWEEP_VALUES: usize = 1_000;

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> LoanCalcResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(LoanCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(LoanCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let too_many = || LoanCalcError::InvalidInput {
        field: format!("variable:{}", var.name),
        reason: format!("Sweep exceeds {MAX_SWEEP_VALUES} values; use a larger step"),
    };
    let steps = var
        .max
        .checked_sub(var.min)
        .and_then(|span| span.checked_div(var.step))
        .ok_or_else(too_many)?;
    if steps >= Decimal::from(MAX_SWEEP_VALUES) {
        return Err(too_many());
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current = match current.checked_add(var.step) {
            Some(next) => next,
            None => break,
        };
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Term sweep values must be whole, non-negative month counts.
fn to_term_months(var: &SensitivityVariable, values: &[Decimal]) -> LoanCalcResult<Vec<u32>> {
    values
        .iter()
        .map(|v| {
            if !v.fract().is_zero() {
                return Err(LoanCalcError::InvalidInput {
                    field: format!("variable:{}", var.name),
                    reason: format!("Term {v} is not a whole number of months"),
                });
            }
            v.to_u32().ok_or_else(|| LoanCalcError::InvalidInput {
                field: format!("variable:{}", var.name),
                reason: format!("Term {v} is out of range"),
            })
        })
        .collect()
}

/// Evaluate a 2-way grid with `eval_fn(variable_1_value, variable_2_value)`.
///
/// The base case is the cell closest to the midpoint of both ranges.
pub fn evaluate_grid<F>(
    variable_1: &SensitivityVariable,
    variable_2: &SensitivityVariable,
    output_metric: SensitivityMetric,
    eval_fn: F,
) -> LoanCalcResult<SensitivityOutput>
where
    F: Fn(Decimal, Decimal) -> Money,
{
    let v1_values = generate_sweep_values(variable_1)?;
    let v2_values = generate_sweep_values(variable_2)?;

    let matrix: Vec<Vec<Money>> = v1_values
        .iter()
        .map(|v1| v2_values.iter().map(|v2| eval_fn(*v1, *v2)).collect())
        .collect();

    let mid1 = (variable_1.min + variable_1.max) / dec!(2);
    let mid2 = (variable_2.min + variable_2.max) / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    Ok(SensitivityOutput {
        variable_1_name: variable_1.name.clone(),
        variable_2_name: variable_2.name.clone(),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        output_metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    })
}

/// Repayment across a sweep of annual rates (rows) and terms (columns).
pub fn evaluate_rate_term_sensitivity(
    input: &RateTermSensitivityInput,
) -> LoanCalcResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let principal = input.amount.sanitize();
    let terms = generate_sweep_values(&input.term)?;
    to_term_months(&input.term, &terms)?;

    let output = evaluate_grid(&input.rate, &input.term, input.metric, |rate, term| {
        // Terms were validated as whole u32 months above
        let months = term.to_u32().unwrap_or(0);
        let result = calculate(principal, months, rate, input.repayment_period);
        match input.metric {
            SensitivityMetric::Period => result.period,
            SensitivityMetric::Total => result.total,
        }
    })?;

    let zero_cells = output
        .matrix
        .iter()
        .flatten()
        .filter(|v| v.is_zero())
        .count();
    if zero_cells > 0 {
        warnings.push(format!("{zero_cells} grid cells have a zero repayment"));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity: annual rate x term",
        &serde_json::json!({
            "principal": principal.to_string(),
            "repayment_period": input.repayment_period,
            "rate": input.rate.name,
            "term": input.term.name,
        }),
        warnings,
        elapsed,
        output,
    ))
}
