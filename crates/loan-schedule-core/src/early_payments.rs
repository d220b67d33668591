//! Early-repayment declarations flattened into one dated event list.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::config::EngineConfig;
use crate::loan::{ApplicationMode, OneTimeEarlyPayment, PeriodicEarlyPayment};
use crate::types::Money;
use crate::LoanScheduleResult;

/// One early repayment on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyPaymentEvent {
    pub date: NaiveDate,
    pub amount: Money,
    pub mode: ApplicationMode,
}

/// Expand one-time and periodic declarations into a chronological event
/// list.
///
/// Each periodic date steps `interval` months from the previous one, so a
/// month-end start clamped in a short month stays on the clamped day
/// (Jan 31, Feb 29, Mar 29, ...). Expansion stops after the
/// end date, which defaults to first payment + `max_periods` months, or
/// after `max_periods` events. Events with a non-positive amount or dated
/// before disbursement are dropped; the final sort is stable.
pub fn expand_early_payments(
    one_time: &[OneTimeEarlyPayment],
    periodic: &[PeriodicEarlyPayment],
    disbursement_date: NaiveDate,
    first_payment_date: NaiveDate,
    config: &EngineConfig,
) -> LoanScheduleResult<Vec<EarlyPaymentEvent>> {
    let mut events = Vec::new();

    for entry in one_time {
        match (entry.date, entry.amount) {
            (Some(date), Some(amount)) => events.push(EarlyPaymentEvent {
                date,
                amount: config.round(amount),
                mode: entry.mode,
            }),
            _ => tracing::warn!(?entry, "skipping incomplete one-time early payment"),
        }
    }

    let default_end = calendar::add_months(first_payment_date, config.max_periods)?;
    for entry in periodic {
        let (Some(start), Some(amount)) = (entry.start_date, entry.amount) else {
            tracing::warn!(?entry, "skipping incomplete periodic early payment");
            continue;
        };
        if entry.interval_periods == 0 {
            tracing::warn!(?entry, "skipping periodic early payment with zero interval");
            continue;
        }
        let end = entry.end_date.unwrap_or(default_end);
        let amount = config.round(amount);

        let mut date = start;
        for _ in 0..config.max_periods {
            if date > end {
                break;
            }
            events.push(EarlyPaymentEvent {
                date,
                amount,
                mode: entry.mode,
            });
            // Past chrono's range means past any end date as well
            match calendar::add_months(date, entry.interval_periods) {
                Ok(next) => date = next,
                Err(_) => break,
            }
        }
    }

    events.retain(|e| e.amount > Decimal::ZERO && e.date >= disbursement_date);
    events.sort_by_key(|e| e.date);
    Ok(events)
}
