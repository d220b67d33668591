use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanScheduleError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation divergence: balance {balance} still outstanding after period {period}")]
    ComputationDivergence { period: u32, balance: Decimal },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanScheduleError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanScheduleError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanScheduleError {
    fn from(e: serde_json::Error) -> Self {
        LoanScheduleError::SerializationError(e.to_string())
    }
}
