//! Schedule for a loan whose first periods carry a third-party interest
//! subsidy (typically a property developer buying down a mortgage rate).
//!
//! Interest here is always actual/365 day-count, inside and after the
//! window. During the window the borrower is charged at the discounted
//! rate and the third party is credited the difference to the full rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::annuity::annuity_payment;
use crate::calendar;
use crate::config::EngineConfig;
use crate::early_payments::EarlyPaymentEvent;
use crate::loan::{LoanParameters, RecalculationPolicy, ResolvedDates, SubsidyPolicy, SubsidyTerms};
use crate::types::{Money, Rate};
use crate::LoanScheduleResult;

use super::ledger::{Ledger, PaymentSummary, RegularPayment};
use super::{next_payment_date, remaining_periods, ScheduleResult};

const PERCENT: Decimal = dec!(100);

/// Where the subsidized-period payment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentSource {
    /// Supplied by the caller; never recomputed.
    Manual,
    /// Annuity at the subsidized rate.
    SubsidizedRate,
    /// Nothing usable supplied: the full-rate annuity.
    FullRate,
}

/// Principal/interest split of one regular period.
#[derive(Debug, Clone, Copy)]
struct Split {
    principal: Money,
    interest: Money,
    payment: Money,
    subsidy: Money,
}

/// `balance * rate% * days / days_in_year`, rounded to the money scale.
fn day_count_interest(
    balance: Money,
    annual_rate: Rate,
    days: Decimal,
    config: &EngineConfig,
) -> Money {
    config.round(balance * (annual_rate / PERCENT) * days / config.days_in_year)
}

/// Split for a period inside the subsidy window.
fn split_in_window(
    policy: SubsidyPolicy,
    discounted_interest: Money,
    full_interest: Money,
    subsidized_payment: Money,
    full_payment: Money,
) -> Split {
    let subsidy = (full_interest - discounted_interest).max(Decimal::ZERO);
    match policy {
        SubsidyPolicy::FixedPayment => {
            if discounted_interest >= subsidized_payment {
                // Borrower pays the interest only; the shortfall is not subsidized
                Split {
                    principal: Decimal::ZERO,
                    interest: discounted_interest,
                    payment: discounted_interest,
                    subsidy,
                }
            } else {
                Split {
                    principal: subsidized_payment - discounted_interest,
                    interest: discounted_interest,
                    payment: subsidized_payment,
                    subsidy,
                }
            }
        }
        SubsidyPolicy::FloatingPayment => {
            let principal = (full_payment - full_interest).max(Decimal::ZERO);
            Split {
                principal,
                interest: discounted_interest,
                payment: principal + discounted_interest,
                subsidy,
            }
        }
    }
}

/// Split for a period after the window: full-rate annuity, never less
/// than the accrued interest.
fn split_after_window(interest: Money, full_payment: Money) -> Split {
    let principal = full_payment - interest;
    if principal <= Decimal::ZERO {
        Split {
            principal: Decimal::ZERO,
            interest,
            payment: full_payment.max(interest),
            subsidy: Decimal::ZERO,
        }
    } else {
        Split {
            principal,
            interest,
            payment: full_payment,
            subsidy: Decimal::ZERO,
        }
    }
}

/// Payments in force for the window and after it.
#[derive(Debug, Clone, Copy)]
struct PaymentPlan {
    full_rate: Rate,
    discounted_rate: Rate,
    source: PaymentSource,
    full: Money,
    subsidized: Money,
}

impl PaymentPlan {
    fn new(
        principal: Money,
        full_rate: Rate,
        terms: &SubsidyTerms,
        duration: u32,
        config: &EngineConfig,
    ) -> LoanScheduleResult<Self> {
        let positive_subsidized_rate = terms.subsidized_rate.filter(|r| *r > Decimal::ZERO);
        let discounted_rate = positive_subsidized_rate.unwrap_or(full_rate);
        let full = annuity_payment(principal, full_rate, duration, config)?;

        let manual = terms
            .manual_payment
            .filter(|p| *p > Decimal::ZERO)
            .map(|p| config.round(p));
        let (source, subsidized) = match (manual, positive_subsidized_rate) {
            (Some(payment), _) => (PaymentSource::Manual, payment),
            (None, Some(rate)) => (
                PaymentSource::SubsidizedRate,
                annuity_payment(principal, rate, duration, config)?,
            ),
            (None, None) => (PaymentSource::FullRate, full),
        };

        Ok(Self {
            full_rate,
            discounted_rate,
            source,
            full,
            subsidized,
        })
    }

    /// Re-amortise the remaining balance over `periods_left`. A manual
    /// subsidized payment is kept as supplied.
    fn recalculate(
        &mut self,
        balance: Money,
        periods_left: u32,
        config: &EngineConfig,
    ) -> LoanScheduleResult<()> {
        self.full = annuity_payment(balance, self.full_rate, periods_left, config)?;
        self.subsidized = match self.source {
            PaymentSource::Manual => self.subsidized,
            PaymentSource::SubsidizedRate => {
                annuity_payment(balance, self.discounted_rate, periods_left, config)?
            }
            PaymentSource::FullRate => self.full,
        };
        tracing::debug!(
            full = %self.full,
            subsidized = %self.subsidized,
            periods_left,
            "payments recalculated after early payment"
        );
        Ok(())
    }
}

pub(crate) fn build(
    params: &LoanParameters,
    terms: &SubsidyTerms,
    dates: ResolvedDates,
    events: Vec<EarlyPaymentEvent>,
    config: &EngineConfig,
) -> LoanScheduleResult<ScheduleResult> {
    let duration = params.duration_periods;
    let window = terms.duration_periods.unwrap_or(0);
    let reduce_payment = params.recalculation == RecalculationPolicy::ReducePayment;

    let mut ledger = Ledger::new(config, params.principal, events);
    let mut plan = PaymentPlan::new(ledger.balance(), params.annual_rate, terms, duration, config)?;
    let initial = plan;

    tracing::debug!(
        subsidized_payment = %plan.subsidized,
        full_payment = %plan.full,
        source = ?plan.source,
        window,
        "subsidized schedule payments"
    );

    let first_payment_date =
        calendar::adjust_for_weekend(dates.first_payment, params.adjust_weekends);
    let mut previous_date = dates.disbursement;
    let mut payment_date = first_payment_date;
    let mut balance_after_subsidy = None;
    let mut period: u32 = 1;

    while !ledger.is_settled() {
        if period > config.max_periods {
            return Err(ledger.divergence(period - 1));
        }
        let periods_left = remaining_periods(duration, period);

        if ledger.apply_between_payments(payment_date) && reduce_payment {
            plan.recalculate(ledger.balance(), periods_left, config)?;
        }
        if ledger.is_settled() {
            break;
        }

        let balance = ledger.balance();
        let days = Decimal::from(calendar::days_between(previous_date, payment_date));
        let full_interest = day_count_interest(balance, plan.full_rate, days, config);

        let mut split = if period <= window {
            let discounted_interest =
                day_count_interest(balance, plan.discounted_rate, days, config);
            split_in_window(
                terms.policy,
                discounted_interest,
                full_interest,
                plan.subsidized,
                plan.full,
            )
        } else {
            split_after_window(full_interest, plan.full)
        };
        if periods_left == 1 || split.principal > balance {
            split.principal = balance;
            split.payment = balance + split.interest;
        }

        ledger.post_regular(RegularPayment {
            period,
            date: payment_date,
            payment: split.payment,
            principal: split.principal,
            interest: split.interest,
            subsidy: Some(split.subsidy),
        });
        if period == window {
            balance_after_subsidy = Some(config.round(ledger.balance().max(Decimal::ZERO)));
        }

        if ledger.apply_on_payment_date(payment_date) && reduce_payment {
            plan.recalculate(ledger.balance(), remaining_periods(duration, period + 1), config)?;
        }

        previous_date = payment_date;
        period += 1;
        payment_date = next_payment_date(dates.disbursement, period, params.adjust_weekends)?;
    }

    Ok(ledger.finish(PaymentSummary {
        first_payment_date,
        full_payment: Some(initial.full),
        subsidized_payment: Some(initial.subsidized),
        balance_after_subsidy,
    }))
}
