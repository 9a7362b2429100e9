//! Error taxonomy for the account ledger.
//!
//! Every operation returns one of these variants so callers can react
//! without string matching. All variants except [`BankError::Unavailable`]
//! are business-rule failures the caller can surface and recover from.

use crate::account::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Account {0} not found")]
    NotFound(i64),

    /// PIN mismatch. Deliberately does not say which part failed.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Account {0} is locked, contact support")]
    AccountLocked(i64),

    #[error("Source account {0} is locked")]
    SourceLocked(i64),

    #[error("Destination account {0} is locked")]
    DestinationLocked(i64),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Credential hashing failed: {0}")]
    Hashing(String),

    /// Store unreachable or a statement failed. Fatal to the operation only;
    /// nothing was applied, so the caller may retry the whole call.
    #[error("Service unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl BankError {
    /// True for business-rule failures the caller should surface verbatim.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BankError::Unavailable(_) | BankError::Hashing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_failures_are_recoverable() {
        assert!(BankError::InvalidAmount.is_recoverable());
        assert!(BankError::NotFound(42).is_recoverable());
        assert!(BankError::InvalidCredential.is_recoverable());
        assert!(BankError::AccountLocked(7).is_recoverable());
        assert!(BankError::InsufficientFunds.is_recoverable());
    }

    #[test]
    fn test_store_failure_is_not_recoverable() {
        let err = BankError::Unavailable(sqlx::Error::PoolTimedOut);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_credential_message_reveals_nothing() {
        assert_eq!(BankError::InvalidCredential.to_string(), "Invalid credential");
    }

    #[test]
    fn test_locked_message_names_account() {
        assert_eq!(
            BankError::AccountLocked(12).to_string(),
            "Account 12 is locked, contact support"
        );
    }
}
