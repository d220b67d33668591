use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::config::EngineConfig;
use crate::error::LoanScheduleError;
use crate::types::{Money, Rate};
use crate::LoanScheduleResult;

const PERCENT: Decimal = dec!(100);
const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly rate as a fraction: annual percent / 100 / 12.
pub fn monthly_rate(annual_rate: Rate) -> Decimal {
    annual_rate / PERCENT / MONTHS_PER_YEAR
}

/// Flat monthly interest on a balance, rounded to the money scale.
pub fn monthly_interest(balance: Money, annual_rate: Rate, config: &EngineConfig) -> Money {
    config.round(balance * monthly_rate(annual_rate))
}

/// Level payment that amortises `principal` over `periods` months at
/// `annual_rate` percent, rounded half-up to the money scale.
///
/// `P * r * (1+r)^n / ((1+r)^n - 1)`, or `P / n` when the rate is zero.
pub fn annuity_payment(
    principal: Money,
    annual_rate: Rate,
    periods: u32,
    config: &EngineConfig,
) -> LoanScheduleResult<Money> {
    if periods == 0 {
        return Err(LoanScheduleError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if principal < Decimal::ZERO {
        return Err(LoanScheduleError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }
    if annual_rate < Decimal::ZERO {
        return Err(LoanScheduleError::invalid(
            "annual_rate",
            "Annual rate cannot be negative",
        ));
    }

    let nper = Decimal::from(periods);
    let rate = monthly_rate(annual_rate);
    if rate.is_zero() {
        return Ok(config.round(principal / nper));
    }

    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| {
            LoanScheduleError::invalid(
                "annual_rate",
                format!("Compounding factor overflows over {periods} periods"),
            )
        })?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Ok(config.round(principal / nper));
    }

    // factor / (factor - 1) stays near 1, so the product cannot overflow
    Ok(config.round(principal * rate * (factor / denominator)))
}
