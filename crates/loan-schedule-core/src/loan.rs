//! Loan parameters as handed over by the upstream form layer.
//!
//! Values arrive pre-validated for ranges and date ordering, but list
//! entries mirror the form model: a declaration may lack a date or an
//! amount, in which case the pre-processing stages skip it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::LoanScheduleError;
use crate::types::{Currency, LoanType, Money, Rate};
use crate::LoanScheduleResult;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How each regular payment is split between principal and interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentScheme {
    /// Level payment; the principal share grows as interest shrinks.
    #[default]
    Annuity,
    /// Level principal; the payment declines with the balance.
    Differential,
}

/// What an early repayment buys the borrower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalculationPolicy {
    /// Keep the payment, finish sooner.
    #[default]
    ReduceTerm,
    /// Keep the term, recompute a smaller payment.
    ReducePayment,
}

/// When an early repayment is applied relative to the regular payment of
/// the same date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMode {
    /// Right after the regular payment dated the same day.
    #[default]
    OnPaymentDate,
    /// Before the next regular payment is computed.
    BetweenPayments,
}

/// How the borrower's payment is set during the subsidy window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsidyPolicy {
    /// A level payment (subsidized-rate annuity or a manual amount).
    #[default]
    FixedPayment,
    /// Full-rate principal plus discounted interest.
    FloatingPayment,
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A dated change of the annual rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_rate: Option<Rate>,
}

/// A single early repayment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneTimeEarlyPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub mode: ApplicationMode,
}

/// An early repayment repeated every `interval_periods` months from
/// `start_date` up to and including `end_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicEarlyPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_interval")]
    pub interval_periods: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub mode: ApplicationMode,
}

fn default_interval() -> u32 {
    1
}

/// Third-party (developer) interest subsidy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubsidyTerms {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsidized_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_periods: Option<u32>,
    #[serde(default)]
    pub policy: SubsidyPolicy,
    /// Borrower payment during the window, overriding the computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_payment: Option<Money>,
}

impl SubsidyTerms {
    /// Enabled, with a positive window and something to derive the
    /// discounted payment from.
    pub fn is_active(&self) -> bool {
        self.enabled
            && self.duration_periods.is_some_and(|d| d > 0)
            && (self.manual_payment.is_some() || self.subsidized_rate.is_some())
    }
}

// ---------------------------------------------------------------------------
// Loan parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    #[serde(default)]
    pub loan_type: LoanType,
    #[serde(default)]
    pub currency: Currency,
    pub principal: Money,
    /// Base annual rate, percent.
    pub annual_rate: Rate,
    pub duration_periods: u32,
    #[serde(default)]
    pub scheme: RepaymentScheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
    /// Defaults to one month after disbursement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub recalculation: RecalculationPolicy,
    #[serde(default)]
    pub adjust_weekends: bool,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
    #[serde(default)]
    pub early_payments: Vec<OneTimeEarlyPayment>,
    #[serde(default)]
    pub periodic_early_payments: Vec<PeriodicEarlyPayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsidy: Option<SubsidyTerms>,
}

/// The date anchors every computation needs, resolved once up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDates {
    pub disbursement: NaiveDate,
    /// Unadjusted first payment date; the rate timeline is seeded here.
    pub first_payment: NaiveDate,
}

impl LoanParameters {
    /// Minimal annuity loan; everything optional left empty.
    pub fn new(
        principal: Money,
        annual_rate: Rate,
        duration_periods: u32,
        disbursement_date: NaiveDate,
    ) -> Self {
        Self {
            loan_type: LoanType::default(),
            currency: Currency::default(),
            principal,
            annual_rate,
            duration_periods,
            scheme: RepaymentScheme::default(),
            disbursement_date: Some(disbursement_date),
            first_payment_date: None,
            recalculation: RecalculationPolicy::default(),
            adjust_weekends: false,
            rate_changes: Vec::new(),
            early_payments: Vec::new(),
            periodic_early_payments: Vec::new(),
            subsidy: None,
        }
    }

    /// Subsidy terms, only when they select the subsidized builder.
    pub fn active_subsidy(&self) -> Option<&SubsidyTerms> {
        self.subsidy.as_ref().filter(|s| s.is_active())
    }

    /// Fail fast on anything that would make iteration meaningless.
    pub fn validate(&self) -> LoanScheduleResult<ResolvedDates> {
        if self.principal <= Decimal::ZERO {
            return Err(LoanScheduleError::invalid(
                "principal",
                "Principal must be positive",
            ));
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(LoanScheduleError::invalid(
                "annual_rate",
                "Annual rate cannot be negative",
            ));
        }
        if self.duration_periods == 0 {
            return Err(LoanScheduleError::invalid(
                "duration_periods",
                "Duration must be at least 1 period",
            ));
        }
        let disbursement = self.disbursement_date.ok_or_else(|| {
            LoanScheduleError::invalid("disbursement_date", "Disbursement date is required")
        })?;
        let first_payment = match self.first_payment_date {
            Some(date) => date,
            None => calendar::add_months(disbursement, 1).map_err(|e| {
                LoanScheduleError::invalid(
                    "first_payment_date",
                    format!("Cannot resolve first payment date: {e}"),
                )
            })?,
        };
        if first_payment < disbursement {
            return Err(LoanScheduleError::invalid(
                "first_payment_date",
                "First payment cannot precede disbursement",
            ));
        }
        // Period 2 falls two months after disbursement; the first payment
        // must land strictly before it, after weekend adjustment on both.
        let second_payment = calendar::add_months(disbursement, 2).map_err(|e| {
            LoanScheduleError::invalid(
                "first_payment_date",
                format!("Cannot resolve second payment date: {e}"),
            )
        })?;
        if calendar::adjust_for_weekend(first_payment, self.adjust_weekends)
            >= calendar::adjust_for_weekend(second_payment, self.adjust_weekends)
        {
            return Err(LoanScheduleError::invalid(
                "first_payment_date",
                format!("First payment must fall before the second payment on {second_payment}"),
            ));
        }

        if let Some(subsidy) = self.active_subsidy() {
            if subsidy.subsidized_rate.is_some_and(|r| r < Decimal::ZERO) {
                return Err(LoanScheduleError::invalid(
                    "subsidy.subsidized_rate",
                    "Subsidized rate cannot be negative",
                ));
            }
        }

        Ok(ResolvedDates {
            disbursement,
            first_payment,
        })
    }
}
