use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::early_payments::EarlyPaymentEvent;
use crate::error::LoanScheduleError;
use crate::loan::ApplicationMode;
use crate::types::Money;

use super::{ScheduleEntry, ScheduleResult};

/// One regular period after the principal/interest split.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegularPayment {
    pub period: u32,
    pub date: NaiveDate,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub subsidy: Option<Money>,
}

/// Figures the builders report alongside the rows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PaymentSummary {
    pub first_payment_date: NaiveDate,
    pub full_payment: Option<Money>,
    pub subsidized_payment: Option<Money>,
    pub balance_after_subsidy: Option<Money>,
}

/// Running balance, emitted rows and totals shared by both builders,
/// plus the queue of early payments not yet applied.
pub(crate) struct Ledger<'a> {
    config: &'a EngineConfig,
    balance: Money,
    pending: Vec<EarlyPaymentEvent>,
    skipped: Vec<EarlyPaymentEvent>,
    entries: Vec<ScheduleEntry>,
    total_payment: Money,
    total_interest: Money,
    total_subsidy: Money,
}

impl<'a> Ledger<'a> {
    pub fn new(config: &'a EngineConfig, principal: Money, events: Vec<EarlyPaymentEvent>) -> Self {
        Self {
            config,
            balance: config.round(principal),
            pending: events,
            skipped: Vec::new(),
            entries: Vec::new(),
            total_payment: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            total_subsidy: Decimal::ZERO,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn is_settled(&self) -> bool {
        self.config.is_settled(self.balance)
    }

    pub fn divergence(&self, period: u32) -> LoanScheduleError {
        LoanScheduleError::ComputationDivergence {
            period,
            balance: self.balance,
        }
    }

    /// Apply every pending `BetweenPayments` event dated on or before the
    /// upcoming payment. Returns true when the balance moved.
    pub fn apply_between_payments(&mut self, payment_date: NaiveDate) -> bool {
        let due = self.take_pending(|e| {
            e.mode == ApplicationMode::BetweenPayments && e.date <= payment_date
        });
        self.apply_all(due)
    }

    /// Apply every pending `OnPaymentDate` event dated exactly on the
    /// payment just made. Returns true when the balance moved.
    ///
    /// `OnPaymentDate` events dated on or before this payment that did not
    /// match it can never match a later one; they are set aside as skipped.
    pub fn apply_on_payment_date(&mut self, payment_date: NaiveDate) -> bool {
        let due = self.take_pending(|e| {
            e.mode == ApplicationMode::OnPaymentDate && e.date == payment_date
        });
        let applied = self.apply_all(due);

        let stale = self.take_pending(|e| {
            e.mode == ApplicationMode::OnPaymentDate && e.date <= payment_date
        });
        for event in &stale {
            tracing::warn!(
                date = %event.date,
                amount = %event.amount,
                "early payment does not fall on a payment date and was not applied"
            );
        }
        self.skipped.extend(stale);
        applied
    }

    pub fn post_regular(&mut self, row: RegularPayment) {
        self.balance -= row.principal;
        self.total_payment += row.payment;
        self.total_interest += row.interest;
        if let Some(subsidy) = row.subsidy {
            self.total_subsidy += subsidy;
        }
        self.entries.push(ScheduleEntry {
            period: row.period,
            payment_date: row.date,
            payment: self.config.round(row.payment),
            principal: self.config.round(row.principal),
            interest: self.config.round(row.interest),
            remaining_balance: self.config.round(self.balance.max(Decimal::ZERO)),
            subsidy: row.subsidy.map(|s| self.config.round(s)),
            is_early_payment: false,
        });
    }

    pub fn finish(self, summary: PaymentSummary) -> ScheduleResult {
        let regular_payment_count = self.entries.iter().filter(|e| !e.is_early_payment).count();
        let early_payment_count = self.entries.len() - regular_payment_count;
        let final_payment_date = self.entries.last().map(|e| e.payment_date);

        tracing::debug!(
            rows = self.entries.len(),
            total_payment = %self.total_payment,
            total_interest = %self.total_interest,
            "schedule complete"
        );

        ScheduleResult {
            entries: self.entries,
            total_payment: self.config.round(self.total_payment),
            total_interest: self.config.round(self.total_interest),
            total_subsidy: self.config.round(self.total_subsidy),
            subsidized_payment: summary.subsidized_payment,
            full_payment: summary.full_payment,
            balance_after_subsidy: summary.balance_after_subsidy,
            first_payment_date: summary.first_payment_date,
            final_payment_date,
            regular_payment_count: regular_payment_count as u32,
            early_payment_count: early_payment_count as u32,
            skipped_early_payments: self.skipped,
        }
    }

    /// Remove matching events from the queue, preserving order on both sides.
    fn take_pending(
        &mut self,
        pred: impl Fn(&EarlyPaymentEvent) -> bool,
    ) -> Vec<EarlyPaymentEvent> {
        let (due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|e| pred(e));
        self.pending = rest;
        due
    }

    fn apply_all(&mut self, events: Vec<EarlyPaymentEvent>) -> bool {
        let mut applied = false;
        for event in events {
            applied |= self.apply(event);
        }
        applied
    }

    /// Deduct min(amount, balance) and emit an injected row. An event that
    /// meets a zero balance is consumed without a row.
    fn apply(&mut self, event: EarlyPaymentEvent) -> bool {
        let deducted = self.config.round(event.amount.min(self.balance));
        if deducted <= Decimal::ZERO {
            return false;
        }
        self.balance -= deducted;
        self.total_payment += deducted;
        tracing::debug!(
            date = %event.date,
            mode = ?event.mode,
            %deducted,
            balance = %self.balance,
            "early payment applied"
        );
        self.entries.push(ScheduleEntry {
            period: 0,
            payment_date: event.date,
            payment: deducted,
            principal: deducted,
            interest: Decimal::ZERO,
            remaining_balance: self.config.round(self.balance.max(Decimal::ZERO)),
            subsidy: None,
            is_early_payment: true,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(date: NaiveDate, amount: Money, mode: ApplicationMode) -> EarlyPaymentEvent {
        EarlyPaymentEvent { date, amount, mode }
    }

    #[test]
    fn test_between_payments_consumes_due_events_only() {
        let config = EngineConfig::default();
        let mut ledger = Ledger::new(
            &config,
            dec!(1000),
            vec![
                event(d(2024, 1, 10), dec!(100), ApplicationMode::BetweenPayments),
                event(d(2024, 1, 15), dec!(50), ApplicationMode::OnPaymentDate),
                event(d(2024, 2, 10), dec!(100), ApplicationMode::BetweenPayments),
            ],
        );
        assert!(ledger.apply_between_payments(d(2024, 1, 15)));
        assert_eq!(ledger.balance(), dec!(900));
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.pending.len(), 2);
    }

    #[test]
    fn test_on_payment_date_requires_exact_match() {
        let config = EngineConfig::default();
        let mut ledger = Ledger::new(
            &config,
            dec!(1000),
            vec![
                event(d(2024, 1, 10), dec!(100), ApplicationMode::OnPaymentDate),
                event(d(2024, 1, 15), dec!(50), ApplicationMode::OnPaymentDate),
                event(d(2024, 3, 15), dec!(50), ApplicationMode::OnPaymentDate),
            ],
        );
        assert!(ledger.apply_on_payment_date(d(2024, 1, 15)));
        assert_eq!(ledger.balance(), dec!(950));
        assert_eq!(ledger.skipped.len(), 1);
        assert_eq!(ledger.skipped[0].date, d(2024, 1, 10));
        assert_eq!(ledger.pending.len(), 1);
    }

    #[test]
    fn test_deduction_capped_at_balance() {
        let config = EngineConfig::default();
        let mut ledger = Ledger::new(
            &config,
            dec!(300),
            vec![
                event(d(2024, 1, 10), dec!(500), ApplicationMode::BetweenPayments),
                event(d(2024, 1, 11), dec!(500), ApplicationMode::BetweenPayments),
            ],
        );
        assert!(ledger.apply_between_payments(d(2024, 1, 15)));
        assert_eq!(ledger.balance(), Decimal::ZERO);
        // second event met a zero balance: consumed, no row
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.entries[0].principal, dec!(300));
        assert!(ledger.pending.is_empty());
    }
}
