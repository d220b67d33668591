//! Month-by-month schedule for loans without a subsidy.
//!
//! Interest uses the flat monthly approximation (balance * rate / 12);
//! payment dates step from the disbursement date one month at a time.

use rust_decimal::Decimal;

use crate::annuity::{annuity_payment, monthly_interest};
use crate::calendar;
use crate::config::EngineConfig;
use crate::early_payments::EarlyPaymentEvent;
use crate::loan::{LoanParameters, RecalculationPolicy, RepaymentScheme, ResolvedDates};
use crate::rates::RateTimeline;
use crate::LoanScheduleResult;

use super::ledger::{Ledger, PaymentSummary, RegularPayment};
use super::{next_payment_date, remaining_periods, ScheduleResult};

pub(crate) fn build(
    params: &LoanParameters,
    dates: ResolvedDates,
    timeline: &RateTimeline,
    events: Vec<EarlyPaymentEvent>,
    config: &EngineConfig,
) -> LoanScheduleResult<ScheduleResult> {
    let duration = params.duration_periods;
    let scheme = params.scheme;
    let reduce_payment = scheme == RepaymentScheme::Annuity
        && params.recalculation == RecalculationPolicy::ReducePayment;

    let mut ledger = Ledger::new(config, params.principal, events);
    let first_payment_date =
        calendar::adjust_for_weekend(dates.first_payment, params.adjust_weekends);
    let mut payment_date = first_payment_date;
    let mut current_rate = timeline.rate_at(payment_date);
    let mut fixed_payment = match scheme {
        RepaymentScheme::Annuity => {
            annuity_payment(ledger.balance(), current_rate, duration, config)?
        }
        RepaymentScheme::Differential => Decimal::ZERO,
    };
    let initial_payment = fixed_payment;
    let mut period: u32 = 1;

    while !ledger.is_settled() {
        if period > config.max_periods {
            return Err(ledger.divergence(period - 1));
        }
        let periods_left = remaining_periods(duration, period);

        if ledger.apply_between_payments(payment_date) && reduce_payment {
            fixed_payment = annuity_payment(ledger.balance(), current_rate, periods_left, config)?;
            tracing::debug!(period, %fixed_payment, "payment recalculated after early payment");
        }
        if ledger.is_settled() {
            break;
        }

        let rate = timeline.rate_at(payment_date);
        if scheme == RepaymentScheme::Annuity && rate != current_rate {
            fixed_payment = annuity_payment(ledger.balance(), rate, periods_left, config)?;
            tracing::debug!(
                period,
                %rate,
                %fixed_payment,
                "payment recalculated after rate change"
            );
        }
        current_rate = rate;

        let balance = ledger.balance();
        let interest = monthly_interest(balance, rate, config);
        let (mut principal, mut payment) = match scheme {
            RepaymentScheme::Differential => {
                let principal = config
                    .round(balance / Decimal::from(periods_left))
                    .min(balance);
                (principal, principal + interest)
            }
            RepaymentScheme::Annuity if periods_left == 1 => (balance, balance + interest),
            RepaymentScheme::Annuity => {
                let principal = fixed_payment - interest;
                if principal <= Decimal::ZERO {
                    // Interest swallows the payment: never pay less than accrued interest
                    (Decimal::ZERO, fixed_payment.max(interest))
                } else {
                    (principal, fixed_payment)
                }
            }
        };
        if principal > balance {
            principal = balance;
            payment = principal + interest;
        }

        ledger.post_regular(RegularPayment {
            period,
            date: payment_date,
            payment,
            principal,
            interest,
            subsidy: None,
        });

        if ledger.apply_on_payment_date(payment_date) && reduce_payment {
            let left = remaining_periods(duration, period + 1);
            fixed_payment = annuity_payment(ledger.balance(), current_rate, left, config)?;
            tracing::debug!(period, %fixed_payment, "payment recalculated after early payment");
        }

        period += 1;
        payment_date = next_payment_date(dates.disbursement, period, params.adjust_weekends)?;
    }

    Ok(ledger.finish(PaymentSummary {
        first_payment_date,
        full_payment: match scheme {
            RepaymentScheme::Annuity => Some(initial_payment),
            RepaymentScheme::Differential => None,
        },
        subsidized_payment: None,
        balance_after_subsidy: None,
    }))
}
