//! Ledger error types
//!
//! Every variant is a user-input validation failure. None of them leaves the
//! ledger modified.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A required form field was empty after trimming
    #[error("Please fill in the {field} field")]
    MissingField { field: &'static str },

    /// Text field longer than the allowed number of characters
    #[error("The {field} field is limited to {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Amount text is not a finite number greater than zero
    #[error("'{input}' is not a valid amount")]
    InvalidAmount { input: String },
}

impl LedgerError {
    pub fn missing(field: &'static str) -> Self {
        LedgerError::MissingField { field }
    }

    pub fn too_long(field: &'static str, max: usize) -> Self {
        LedgerError::TooLong { field, max }
    }

    pub fn invalid_amount(input: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            input: input.into(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
