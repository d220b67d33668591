//! Numeric policy shared by every schedule component.
//!
//! The engine never reads ambient globals: rounding scale, settlement
//! epsilon, iteration cap and the day-count year length all travel in an
//! [`EngineConfig`] handed to the entry point.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LoanScheduleError;
use crate::types::Money;
use crate::LoanScheduleResult;

/// Decimal places kept on every monetary amount.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Balance at or below which a loan counts as settled.
pub const DEFAULT_SETTLEMENT_EPSILON: Decimal = dec!(0.009);

/// Safety bound on schedule length and on periodic early-payment expansion.
pub const DEFAULT_MAX_PERIODS: u32 = 720;

/// Actual/365 denominator used for day-count interest.
pub const DEFAULT_DAYS_IN_YEAR: Decimal = dec!(365);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub money_scale: u32,
    pub settlement_epsilon: Decimal,
    pub max_periods: u32,
    pub days_in_year: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            money_scale: DEFAULT_MONEY_SCALE,
            settlement_epsilon: DEFAULT_SETTLEMENT_EPSILON,
            max_periods: DEFAULT_MAX_PERIODS,
            days_in_year: DEFAULT_DAYS_IN_YEAR,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> LoanScheduleResult<()> {
        if self.max_periods == 0 {
            return Err(LoanScheduleError::invalid(
                "max_periods",
                "Iteration cap must be at least 1 period",
            ));
        }
        if self.settlement_epsilon < Decimal::ZERO {
            return Err(LoanScheduleError::invalid(
                "settlement_epsilon",
                "Settlement epsilon cannot be negative",
            ));
        }
        if self.days_in_year <= Decimal::ZERO {
            return Err(LoanScheduleError::invalid(
                "days_in_year",
                "Day-count year length must be positive",
            ));
        }
        // rust_decimal carries at most 28 fractional digits
        if self.money_scale > 28 {
            return Err(LoanScheduleError::invalid(
                "money_scale",
                "Money scale cannot exceed 28 decimal places",
            ));
        }
        Ok(())
    }

    /// Round half-up (away from zero) to the configured money scale.
    pub fn round(&self, value: Decimal) -> Money {
        value.round_dp_with_strategy(self.money_scale, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn is_settled(&self, balance: Money) -> bool {
        balance <= self.settlement_epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_periods, 720);
        assert_eq!(config.settlement_epsilon, dec!(0.009));
    }

    #[test]
    fn test_round_half_up() {
        let config = EngineConfig::default();
        assert_eq!(config.round(dec!(10.005)), dec!(10.01));
        assert_eq!(config.round(dec!(10.0049)), dec!(10.00));
        assert_eq!(config.round(dec!(-10.005)), dec!(-10.01));
    }

    #[test]
    fn test_settlement_threshold() {
        let config = EngineConfig::default();
        assert!(config.is_settled(dec!(0.009)));
        assert!(config.is_settled(Decimal::ZERO));
        assert!(!config.is_settled(dec!(0.01)));
    }

    #[test]
    fn test_zero_cap_rejected() {
        let config = EngineConfig {
            max_periods: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_periods": 24}"#).unwrap();
        assert_eq!(config.max_periods, 24);
        assert_eq!(config.money_scale, 2);
        assert_eq!(config.days_in_year, dec!(365));
    }
}
