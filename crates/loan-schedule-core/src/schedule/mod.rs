//! Amortization schedule generation.
//!
//! [`build_schedule`] validates the parameters, expands early payments,
//! builds the rate timeline and hands both to one of two builders: the
//! standard builder (flat monthly interest, annuity or differential) or,
//! when an active subsidy block is present, the subsidized builder
//! (actual/365 day-count interest with a discounted-rate window).

pub(crate) mod ledger;
mod standard;
mod subsidized;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar;
use crate::config::EngineConfig;
use crate::early_payments::{expand_early_payments, EarlyPaymentEvent};
use crate::loan::{LoanParameters, RepaymentScheme};
use crate::rates::RateTimeline;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanScheduleResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A single row of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Regular period number; 0 on injected early-payment rows.
    pub period: u32,
    pub payment_date: NaiveDate,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    /// Balance outstanding after this row.
    pub remaining_balance: Money,
    /// Third-party subsidy credited for the period (subsidized loans only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsidy: Option<Money>,
    pub is_early_payment: bool,
}

/// Chronological rows plus aggregate totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub entries: Vec<ScheduleEntry>,
    /// Everything the borrower pays, early payments included.
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_subsidy: Money,
    /// Payment in force during the subsidy window, as first determined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsidized_payment: Option<Money>,
    /// Initial full-rate annuity payment (absent for differential loans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_payment: Option<Money>,
    /// Balance right after the last subsidized period's principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after_subsidy: Option<Money>,
    pub first_payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_payment_date: Option<NaiveDate>,
    pub regular_payment_count: u32,
    pub early_payment_count: u32,
    /// On-payment-date early payments that never coincided with a payment.
    pub skipped_early_payments: Vec<EarlyPaymentEvent>,
}

impl ScheduleResult {
    /// Rows for regular periods only.
    pub fn regular_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| !e.is_early_payment)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the schedule for one loan. Pure and deterministic.
pub fn build_schedule(
    params: &LoanParameters,
    config: &EngineConfig,
) -> LoanScheduleResult<ScheduleResult> {
    config.validate()?;
    let dates = params.validate()?;

    let events = expand_early_payments(
        &params.early_payments,
        &params.periodic_early_payments,
        dates.disbursement,
        dates.first_payment,
        config,
    )?;

    match params.active_subsidy() {
        Some(terms) => subsidized::build(params, terms, dates, events, config),
        None => {
            let timeline =
                RateTimeline::build(params.annual_rate, dates.first_payment, &params.rate_changes);
            if timeline.has_changes() {
                tracing::debug!(breakpoints = timeline.periods().len(), "rate timeline built");
            }
            standard::build(params, dates, &timeline, events, config)
        }
    }
}

/// [`build_schedule`] wrapped in the standard computation envelope.
pub fn calculate_schedule(
    params: &LoanParameters,
    config: &EngineConfig,
) -> LoanScheduleResult<ComputationOutput<ScheduleResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let subsidy = params.active_subsidy();
    if subsidy.is_none() && params.subsidy.as_ref().is_some_and(|s| s.enabled) {
        warnings.push(
            "Subsidy enabled without a window and a subsidized rate or payment; \
             standard schedule used"
                .into(),
        );
    }
    if subsidy.is_some() && !params.rate_changes.is_empty() {
        warnings.push(
            "Rate changes are ignored for subsidized loans; the full rate applies throughout".into(),
        );
    }

    if subsidy.is_some() && params.scheme == RepaymentScheme::Differential {
        warnings.push(
            "Subsidized loans are amortised as an annuity; the differential scheme is ignored"
                .into(),
        );
    }

    let result = build_schedule(params, config)?;

    for event in &result.skipped_early_payments {
        warnings.push(format!(
            "Early payment of {} on {} does not fall on a payment date and was not applied",
            event.amount, event.date
        ));
    }

    let methodology = match subsidy {
        Some(_) => "Subsidized amortization schedule (actual/365 day-count interest)",
        None => "Amortization schedule (monthly interest)",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "annual_rate": params.annual_rate.to_string(),
            "duration_periods": params.duration_periods,
            "scheme": params.scheme,
            "recalculation": params.recalculation,
            "currency": params.currency,
            "loan_type": params.loan_type,
            "adjust_weekends": params.adjust_weekends,
            "max_periods": config.max_periods,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Helpers shared by the builders
// ---------------------------------------------------------------------------

/// Periods left to amortise over, counting the current one; never below 1.
pub(crate) fn remaining_periods(duration: u32, period: u32) -> u32 {
    duration.saturating_sub(period - 1).max(1)
}

/// Regular payment `period` falls `period` months after disbursement,
/// weekend-adjusted.
pub(crate) fn next_payment_date(
    disbursement: NaiveDate,
    period: u32,
    adjust_weekends: bool,
) -> LoanScheduleResult<NaiveDate> {
    let nominal = calendar::add_months(disbursement, period)?;
    Ok(calendar::adjust_for_weekend(nominal, adjust_weekends))
}
