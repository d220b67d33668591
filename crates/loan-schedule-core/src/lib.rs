//! Loan amortization schedules: annuity and differential repayment, rate
//! changes, early repayments and developer-subsidized mortgages.
//!
//! Every monetary value is a [`rust_decimal::Decimal`] rounded half-up to
//! the scale in [`config::EngineConfig`]. The single entry point is
//! [`schedule::build_schedule`] (or [`schedule::calculate_schedule`] for
//! the metadata envelope).

pub mod annuity;
pub mod calendar;
pub mod config;
pub mod early_payments;
pub mod error;
pub mod loan;
pub mod rates;
pub mod schedule;
pub mod types;

pub use config::EngineConfig;
pub use error::LoanScheduleError;
pub use loan::{
    ApplicationMode, LoanParameters, OneTimeEarlyPayment, PeriodicEarlyPayment, RateChange,
    RecalculationPolicy, RepaymentScheme, SubsidyPolicy, SubsidyTerms,
};
pub use schedule::{build_schedule, calculate_schedule, ScheduleEntry, ScheduleResult};
pub use types::*;

/// Standard result type for all loan-schedule operations
pub type LoanScheduleResult<T> = Result<T, LoanScheduleError>;
