use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use loan_schedule_core::annuity::{annuity_payment, monthly_rate};
use loan_schedule_core::types::{with_metadata, Money};
use loan_schedule_core::EngineConfig;

/// Arguments for a level payment calculation
#[derive(Args)]
pub struct AnnuityArgs {
    /// Loan amount
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate, percent
    #[arg(long)]
    pub rate: Decimal,

    /// Number of monthly periods
    #[arg(long, alias = "months")]
    pub periods: u32,
}

#[derive(Debug, Serialize)]
struct AnnuityOutput {
    payment: Money,
    monthly_rate: Decimal,
    total_payment: Money,
    total_interest: Money,
}

pub fn run_annuity(
    args: AnnuityArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let payment = annuity_payment(args.principal, args.rate, args.periods, config)?;
    // Level-payment totals; the last real installment absorbs rounding
    let total_payment = payment * Decimal::from(args.periods);

    let output = with_metadata(
        "Level annuity payment",
        &serde_json::json!({
            "principal": args.principal.to_string(),
            "annual_rate": args.rate.to_string(),
            "periods": args.periods,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        AnnuityOutput {
            payment,
            monthly_rate: monthly_rate(args.rate),
            total_payment,
            total_interest: total_payment - args.principal,
        },
    );
    Ok(serde_json::to_value(output)?)
}
