use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::loan::RateChange;
use crate::types::Rate;

/// An annual rate in force from `effective_date` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub effective_date: NaiveDate,
    pub annual_rate: Rate,
}

/// Stepwise annual rate over calendar dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTimeline {
    base_rate: Rate,
    periods: Vec<RatePeriod>,
}

impl RateTimeline {
    /// Seed with the base rate at the first payment date, then add every
    /// change carrying both a date and a rate. The sort is stable, so a
    /// change dated on an existing breakpoint overrides it.
    pub fn build(base_rate: Rate, first_payment_date: NaiveDate, changes: &[RateChange]) -> Self {
        let mut periods = Vec::with_capacity(changes.len() + 1);
        periods.push(RatePeriod {
            effective_date: first_payment_date,
            annual_rate: base_rate,
        });
        for change in changes {
            match (change.effective_date, change.new_rate) {
                (Some(effective_date), Some(annual_rate)) => periods.push(RatePeriod {
                    effective_date,
                    annual_rate,
                }),
                _ => tracing::warn!(?change, "skipping incomplete rate change"),
            }
        }
        periods.sort_by_key(|p| p.effective_date);
        Self { base_rate, periods }
    }

    /// Rate of the latest period effective on or before `date`; the base
    /// rate when no period qualifies.
    pub fn rate_at(&self, date: NaiveDate) -> Rate {
        self.periods
            .iter()
            .take_while(|p| p.effective_date <= date)
            .last()
            .map_or(self.base_rate, |p| p.annual_rate)
    }

    pub fn base_rate(&self) -> Rate {
        self.base_rate
    }

    pub fn periods(&self) -> &[RatePeriod] {
        &self.periods
    }

    /// True when at least one declared change survived into the timeline.
    pub fn has_changes(&self) -> bool {
        self.periods.len() > 1
    }
}
