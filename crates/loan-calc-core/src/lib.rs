pub mod error;
pub mod options;
pub mod repayment;
pub mod time_value;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use error::LoanCalcError;
pub use repayment::{calculate, calculate_repayment, LoanAmount, RepaymentResult};
pub use time_value::pmt;
pub use types::*;

/// Standard result type for all loan-calc operations
pub type LoanCalcResult<T> = Result<T, LoanCalcError>;
