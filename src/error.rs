// ❗ Error taxonomy for statement generation
//
// The computational core almost never fails: unknown tags fall back to
// defaults and a bank discrepancy is a reported value, not an error.
// What remains is input validation, configuration editing and I/O.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatementError {
    /// Umbrella condition shown to the operator when a run cannot finish
    #[error("statement computation failed: {0}")]
    ComputationFailed(String),

    #[error("invalid statement period `{0}` (expected YYYY-MM)")]
    InvalidPeriod(String),

    #[error("invalid manual expense `{0}` (expected description:amount[:payout_to])")]
    InvalidExpense(String),

    #[error("property tag must not be empty")]
    EmptyTag,

    #[error("property tag `{0}` already has client settings")]
    DuplicateOverride(String),

    #[error("property tag `{0}` has no client settings")]
    UnknownOverride(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StatementError {
    /// True for errors caused by operator input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StatementError::InvalidPeriod(_)
                | StatementError::InvalidExpense(_)
                | StatementError::EmptyTag
                | StatementError::DuplicateOverride(_)
                | StatementError::UnknownOverride(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;
