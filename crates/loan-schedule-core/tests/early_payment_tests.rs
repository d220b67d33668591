use chrono::NaiveDate;
use loan_schedule_core::{
    build_schedule, calculate_schedule, ApplicationMode, EngineConfig, LoanParameters,
    OneTimeEarlyPayment, PeriodicEarlyPayment, RecalculationPolicy, RepaymentScheme,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn one_time(date: NaiveDate, amount: Decimal, mode: ApplicationMode) -> OneTimeEarlyPayment {
    OneTimeEarlyPayment {
        date: Some(date),
        amount: Some(amount),
        mode,
    }
}

/// 1M at 10% over 12 months with 200k paid on the third payment date.
fn with_early_payment(recalculation: RecalculationPolicy) -> LoanParameters {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.recalculation = recalculation;
    params.early_payments = vec![one_time(
        d(2024, 4, 15),
        dec!(200_000),
        ApplicationMode::OnPaymentDate,
    )];
    params
}

// ===========================================================================
// Recalculation policies
// ===========================================================================

#[test]
fn test_reduce_term_keeps_payment_and_shortens_loan() {
    let result = build_schedule(
        &with_early_payment(RecalculationPolicy::ReduceTerm),
        &EngineConfig::default(),
    )
    .unwrap();

    // Row inserted right after period 3
    let early = &result.entries[3];
    assert!(early.is_early_payment);
    assert_eq!(early.period, 0);
    assert_eq!(early.payment_date, d(2024, 4, 15));
    assert_eq!(early.principal, dec!(200_000));
    assert_eq!(early.interest, Decimal::ZERO);
    assert_eq!(early.remaining_balance, dec!(559257.24));

    assert_eq!(result.regular_payment_count, 10);
    assert_eq!(result.early_payment_count, 1);
    assert_eq!(result.entries[4].payment, dec!(87915.89));
    assert_eq!(result.entries[4].interest, dec!(4660.48));

    let last = result.entries.last().unwrap();
    assert_eq!(last.period, 10);
    assert_eq!(last.payment_date, d(2024, 11, 15));
    assert_eq!(last.payment, dec!(49611.49));
    assert_eq!(last.remaining_balance, Decimal::ZERO);

    assert_eq!(result.total_interest, dec!(40854.50));
    assert_eq!(result.total_payment, dec!(1040854.50));
}

#[test]
fn test_reduce_payment_keeps_term_and_lowers_payment() {
    let result = build_schedule(
        &with_early_payment(RecalculationPolicy::ReducePayment),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(result.regular_payment_count, 12);
    // 559257.24 re-amortised over the 9 remaining periods
    for entry in result.regular_entries().skip(3).take(8) {
        assert_eq!(entry.payment, dec!(64757.49));
    }
    let last = result.entries.last().unwrap();
    assert_eq!(last.payment_date, d(2025, 1, 15));
    assert_eq!(last.payment, dec!(64757.54));
    assert_eq!(result.total_interest, dec!(46565.13));
    assert_eq!(result.full_payment, Some(dec!(87915.89)));
}

#[test]
fn test_reduce_term_saves_more_interest_than_reduce_payment() {
    let config = EngineConfig::default();
    let term =
        build_schedule(&with_early_payment(RecalculationPolicy::ReduceTerm), &config).unwrap();
    let payment =
        build_schedule(&with_early_payment(RecalculationPolicy::ReducePayment), &config).unwrap();
    assert!(term.total_interest < payment.total_interest);
}

// ===========================================================================
// Application modes
// ===========================================================================

#[test]
fn test_between_payments_applied_before_next_regular_payment() {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.early_payments = vec![one_time(
        d(2024, 4, 1),
        dec!(200_000),
        ApplicationMode::BetweenPayments,
    )];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();

    let early = &result.entries[2];
    assert!(early.is_early_payment);
    assert_eq!(early.payment_date, d(2024, 4, 1));
    assert_eq!(early.remaining_balance, dec!(640171.70));

    // Period 3 accrues interest on the reduced balance
    let third = &result.entries[3];
    assert_eq!(third.period, 3);
    assert_eq!(third.interest, dec!(5334.76));
    assert_eq!(result.regular_payment_count, 10);
    assert_eq!(result.total_interest, dec!(39088.14));
}

#[test]
fn test_on_payment_date_off_schedule_is_skipped() {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.early_payments = vec![one_time(
        d(2024, 4, 10),
        dec!(200_000),
        ApplicationMode::OnPaymentDate,
    )];
    let output = calculate_schedule(&params, &EngineConfig::default()).unwrap();
    let result = &output.result;

    assert_eq!(result.entries.len(), 12);
    assert_eq!(result.early_payment_count, 0);
    assert_eq!(result.total_payment, dec!(1054990.65));
    assert_eq!(result.skipped_early_payments.len(), 1);
    assert_eq!(result.skipped_early_payments[0].date, d(2024, 4, 10));
    assert_eq!(output.warnings.len(), 1);
}

#[test]
fn test_skipped_event_does_not_block_later_events() {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.early_payments = vec![
        one_time(d(2024, 4, 10), dec!(50_000), ApplicationMode::OnPaymentDate),
        one_time(d(2024, 5, 15), dec!(50_000), ApplicationMode::OnPaymentDate),
    ];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();
    assert_eq!(result.early_payment_count, 1);
    assert_eq!(result.skipped_early_payments.len(), 1);
    let early: Vec<NaiveDate> = result
        .entries
        .iter()
        .filter(|e| e.is_early_payment)
        .map(|e| e.payment_date)
        .collect();
    assert_eq!(early, vec![d(2024, 5, 15)]);
}

#[test]
fn test_on_payment_date_matches_adjusted_date() {
    // 2024-09-15 is a Sunday; the payment moves to Monday the 16th
    let mut params = LoanParameters::new(dec!(100_000), dec!(12), 6, d(2024, 5, 15));
    params.adjust_weekends = true;
    params.early_payments = vec![one_time(
        d(2024, 9, 16),
        dec!(10_000),
        ApplicationMode::OnPaymentDate,
    )];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();
    assert_eq!(result.early_payment_count, 1);
    assert!(result.skipped_early_payments.is_empty());

    // The nominal date no longer coincides with a payment
    params.early_payments[0].date = Some(d(2024, 9, 15));
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();
    assert_eq!(result.early_payment_count, 0);
    assert_eq!(result.skipped_early_payments.len(), 1);
}

// ===========================================================================
// Edge cases
// ===========================================================================

#[test]
fn test_early_payment_larger_than_balance_closes_loan() {
    let mut params = LoanParameters::new(dec!(100_000), dec!(10), 12, d(2024, 1, 15));
    params.early_payments = vec![one_time(
        d(2024, 3, 1),
        dec!(500_000),
        ApplicationMode::BetweenPayments,
    )];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();

    assert_eq!(result.entries.len(), 2);
    let closing = &result.entries[1];
    assert!(closing.is_early_payment);
    assert_eq!(closing.principal, dec!(92041.74));
    assert_eq!(closing.remaining_balance, Decimal::ZERO);
    assert_eq!(result.final_payment_date, Some(d(2024, 3, 1)));
    assert_eq!(result.total_payment, dec!(100833.33));
    let principal: Decimal = result.entries.iter().map(|e| e.principal).sum();
    assert_eq!(principal, dec!(100_000));
}

#[test]
fn test_invalid_declarations_dropped() {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.early_payments = vec![
        // before disbursement
        one_time(d(2023, 12, 15), dec!(10_000), ApplicationMode::BetweenPayments),
        one_time(d(2024, 3, 15), Decimal::ZERO, ApplicationMode::OnPaymentDate),
        one_time(d(2024, 3, 15), dec!(-5), ApplicationMode::OnPaymentDate),
        OneTimeEarlyPayment {
            date: None,
            amount: Some(dec!(10_000)),
            mode: ApplicationMode::OnPaymentDate,
        },
    ];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();
    assert_eq!(result.early_payment_count, 0);
    assert!(result.skipped_early_payments.is_empty());
    assert_eq!(result.total_payment, dec!(1054990.65));
}

#[test]
fn test_periodic_early_payments_on_payment_dates() {
    let mut params = LoanParameters::new(dec!(1_000_000), dec!(10), 12, d(2024, 1, 15));
    params.periodic_early_payments = vec![PeriodicEarlyPayment {
        start_date: Some(d(2024, 3, 15)),
        end_date: Some(d(2024, 9, 15)),
        interval_periods: 3,
        amount: Some(dec!(50_000)),
        mode: ApplicationMode::OnPaymentDate,
    }];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();

    let early: Vec<NaiveDate> = result
        .entries
        .iter()
        .filter(|e| e.is_early_payment)
        .map(|e| e.payment_date)
        .collect();
    assert_eq!(early, vec![d(2024, 3, 15), d(2024, 6, 15), d(2024, 9, 15)]);
    let principal: Decimal = result.entries.iter().map(|e| e.principal).sum();
    assert_eq!(principal, dec!(1_000_000));
    assert!(result.regular_payment_count < 12);
}

#[test]
fn test_differential_early_payment_lowers_following_principal() {
    let mut params = LoanParameters::new(dec!(120_000), dec!(12), 12, d(2024, 1, 15));
    params.scheme = RepaymentScheme::Differential;
    params.early_payments = vec![one_time(
        d(2024, 4, 15),
        dec!(30_000),
        ApplicationMode::OnPaymentDate,
    )];
    let result = build_schedule(&params, &EngineConfig::default()).unwrap();

    // 60000 left after period 3 and the early payment, spread over 9 periods
    let fourth = result.regular_entries().nth(3).unwrap();
    assert_eq!(fourth.principal, dec!(6666.67));
    assert_eq!(result.regular_payment_count, 12);
    let last = result.entries.last().unwrap();
    assert_eq!(last.remaining_balance, Decimal::ZERO);
}
