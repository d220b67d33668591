use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use loan_schedule_core::{
    calculate_schedule, Currency, EngineConfig, LoanParameters, LoanType, RecalculationPolicy,
    RepaymentScheme, SubsidyPolicy, SubsidyTerms,
};

use crate::input;

/// Parse a flag value by the enum's serialized (snake_case) name, so the
/// CLI accepts exactly what JSON input does.
fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(s.replace('-', "_")))
        .map_err(|_| format!("unrecognised value '{}'", s))
}

/// Currency codes are upper case in JSON.
fn parse_currency(s: &str) -> Result<Currency, String> {
    parse_enum(&s.to_ascii_uppercase())
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON loan parameters (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate, percent (10 = 10% p.a.)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in monthly periods
    #[arg(long, alias = "months")]
    pub duration: Option<u32>,

    /// Disbursement date (YYYY-MM-DD)
    #[arg(long)]
    pub disbursement_date: Option<NaiveDate>,

    /// First payment date (YYYY-MM-DD); defaults to one month after disbursement
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,

    /// Repayment scheme: annuity or differential
    #[arg(long, default_value = "annuity", value_parser = parse_enum::<RepaymentScheme>)]
    pub scheme: RepaymentScheme,

    /// What early repayments reduce: reduce-term or reduce-payment
    #[arg(long, default_value = "reduce-term", value_parser = parse_enum::<RecalculationPolicy>)]
    pub recalculation: RecalculationPolicy,

    /// Move payments falling on a weekend to the following Monday
    #[arg(long)]
    pub adjust_weekends: bool,

    /// Currency code (RUB, USD, EUR); informational only
    #[arg(long, default_value = "RUB", value_parser = parse_currency)]
    pub currency: Currency,

    /// Loan type: consumer or mortgage
    #[arg(long, default_value = "consumer", value_parser = parse_enum::<LoanType>)]
    pub loan_type: LoanType,

    /// Subsidized annual rate, percent (enables the subsidy window)
    #[arg(long)]
    pub subsidy_rate: Option<Decimal>,

    /// Length of the subsidy window in periods
    #[arg(long)]
    pub subsidy_periods: Option<u32>,

    /// Subsidy policy: fixed-payment or floating-payment
    #[arg(long, default_value = "fixed-payment", value_parser = parse_enum::<SubsidyPolicy>)]
    pub subsidy_policy: SubsidyPolicy,

    /// Borrower payment during the subsidy window, overriding the computed one
    #[arg(long)]
    pub subsidy_payment: Option<Decimal>,
}

impl ScheduleArgs {
    fn subsidy_terms(&self) -> Option<SubsidyTerms> {
        if self.subsidy_rate.is_none() && self.subsidy_payment.is_none() {
            return None;
        }
        Some(SubsidyTerms {
            enabled: true,
            subsidized_rate: self.subsidy_rate,
            duration_periods: self.subsidy_periods,
            policy: self.subsidy_policy,
            manual_payment: self.subsidy_payment,
        })
    }
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let params: LoanParameters = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(params) = input::stdin::read_stdin()? {
        params
    } else {
        let mut params = LoanParameters::new(
            args.principal
                .ok_or("--principal is required (or provide --input)")?,
            args.rate.ok_or("--rate is required (or provide --input)")?,
            args.duration
                .ok_or("--duration is required (or provide --input)")?,
            args.disbursement_date
                .ok_or("--disbursement-date is required (or provide --input)")?,
        );
        params.first_payment_date = args.first_payment_date;
        params.scheme = args.scheme;
        params.recalculation = args.recalculation;
        params.adjust_weekends = args.adjust_weekends;
        params.currency = args.currency;
        params.loan_type = args.loan_type;
        params.subsidy = args.subsidy_terms();
        params
    };

    let result = calculate_schedule(&params, config)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_accepts_kebab_and_snake_case() {
        assert_eq!(
            parse_enum::<RecalculationPolicy>("reduce-payment"),
            Ok(RecalculationPolicy::ReducePayment)
        );
        assert_eq!(
            parse_enum::<SubsidyPolicy>("floating_payment"),
            Ok(SubsidyPolicy::FloatingPayment)
        );
        assert!(parse_enum::<RepaymentScheme>("balloon").is_err());
    }

    #[test]
    fn test_parse_currency_case_insensitive() {
        assert_eq!(parse_currency("usd"), Ok(Currency::USD));
    }
}
