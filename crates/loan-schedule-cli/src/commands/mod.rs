pub mod annuity;
pub mod schedule;
