use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::LoanCalcError;
use crate::repayment::{calculate_repayment, LoanAmount, RepaymentInput, RepaymentOutput};
use crate::types::{ComputationOutput, PaymentsPerYear, Rate, FORTNIGHTLY, MONTHLY, WEEKLY};
use crate::LoanCalcResult;

/// Loan purpose with its fixed annual rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPurpose {
    pub label: String,
    /// Lookup key, e.g. `"vehicle"`
    pub value: String,
    #[serde(alias = "annualRate")]
    pub annual_rate: Rate,
}

/// Payment frequency option (weekly = 52 payments/year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentFrequency {
    pub label: String,
    pub value: PaymentsPerYear,
}

/// Loan term option in months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermOption {
    pub label: String,
    pub value: u32,
}

/// Static lookup lists the calculator form is built from.
///
/// Built once (defaults or a config file) and shared by reference; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOptions {
    pub purposes: Vec<LoanPurpose>,
    pub repayment_periods: Vec<RepaymentFrequency>,
    pub term_months: Vec<TermOption>,
}

/// Request to quote a loan by purpose key instead of an explicit rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInput {
    pub amount: LoanAmount,
    pub purpose: String,
    pub repayment_period: PaymentsPerYear,
    pub term_months: u32,
}

impl Default for LoanOptions {
    fn default() -> Self {
        LoanOptions {
            purposes: vec![
                purpose("Day-to-day capital", "general", dec!(0.10)),
                purpose("Vehicle or transport", "vehicle", dec!(0.045)),
                purpose("Property", "property", dec!(0.029)),
            ],
            repayment_periods: vec![
                frequency("Weekly", WEEKLY),
                frequency("Fortnightly", FORTNIGHTLY),
                frequency("Monthly", MONTHLY),
            ],
            term_months: vec![
                term("6 months", 6),
                term("1 year", 12),
                term("2 years", 24),
                term("3 years", 36),
                term("5 years", 60),
                term("10 years", 120),
                term("20 years", 240),
            ],
        }
    }
}

impl LoanOptions {
    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> LoanCalcResult<Self> {
        let options: LoanOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the lists are usable as form options.
    pub fn validate(&self) -> LoanCalcResult<()> {
        if self.purposes.is_empty() {
            return Err(invalid("purposes", "At least one loan purpose is required"));
        }
        if self.repayment_periods.is_empty() {
            return Err(invalid(
                "repayment_periods",
                "At least one repayment frequency is required",
            ));
        }
        if self.term_months.is_empty() {
            return Err(invalid("term_months", "At least one term is required"));
        }

        let mut seen = HashSet::new();
        for p in &self.purposes {
            if !seen.insert(p.value.as_str()) {
                return Err(invalid(
                    "purposes",
                    &format!("Duplicate purpose key '{}'", p.value),
                ));
            }
            if p.annual_rate <= dec!(-1) {
                return Err(invalid(
                    "purposes",
                    &format!("Rate for '{}' must be greater than -100%", p.value),
                ));
            }
        }
        if let Some(f) = self.repayment_periods.iter().find(|f| f.value == 0) {
            return Err(invalid(
                "repayment_periods",
                &format!("'{}' must have at least one payment per year", f.label),
            ));
        }
        if let Some(t) = self.term_months.iter().find(|t| t.value == 0) {
            return Err(invalid(
                "term_months",
                &format!("'{}' must be at least one month", t.label),
            ));
        }
        Ok(())
    }

    pub fn purpose(&self, key: &str) -> Option<&LoanPurpose> {
        self.purposes.iter().find(|p| p.value == key)
    }

    /// Annual rate for a purpose key.
    pub fn rate_for(&self, key: &str) -> LoanCalcResult<Rate> {
        self.purpose(key).map(|p| p.annual_rate).ok_or_else(|| {
            let known: Vec<&str> = self.purposes.iter().map(|p| p.value.as_str()).collect();
            invalid(
                "purpose",
                &format!("Unknown loan purpose '{key}' (expected one of: {})", known.join(", ")),
            )
        })
    }

    pub fn frequency(&self, value: PaymentsPerYear) -> Option<&RepaymentFrequency> {
        self.repayment_periods.iter().find(|f| f.value == value)
    }

    pub fn term(&self, value: u32) -> Option<&TermOption> {
        self.term_months.iter().find(|t| t.value == value)
    }

    /// Resolve the purpose rate and run the repayment calculation.
    pub fn quote(&self, input: &QuoteInput) -> LoanCalcResult<ComputationOutput<RepaymentOutput>> {
        let annual_rate = self.rate_for(&input.purpose)?;
        let mut output = calculate_repayment(&RepaymentInput {
            amount: input.amount.clone(),
            term_months: input.term_months,
            annual_rate,
            repayment_period: input.repayment_period,
        });

        if self.frequency(input.repayment_period).is_none() {
            output.warnings.push(format!(
                "{} payments/year is not one of the offered frequencies",
                input.repayment_period
            ));
        }
        if self.term(input.term_months).is_none() {
            output.warnings.push(format!(
                "{} months is not one of the offered terms",
                input.term_months
            ));
        }
        Ok(output)
    }
}

fn purpose(label: &str, value: &str, annual_rate: Decimal) -> LoanPurpose {
    LoanPurpose {
        label: label.into(),
        value: value.into(),
        annual_rate,
    }
}

fn frequency(label: &str, value: PaymentsPerYear) -> RepaymentFrequency {
    RepaymentFrequency {
        label: label.into(),
        value,
    }
}

fn term(label: &str, value: u32) -> TermOption {
    TermOption {
        label: label.into(),
        value,
    }
}

fn invalid(field: &str, reason: &str) -> LoanCalcError {
    LoanCalcError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}
