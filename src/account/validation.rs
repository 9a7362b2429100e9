//! Input validation for account operations
//!
//! This module provides validated types that enforce input rules before any
//! store access. Fields are private to force validation through the public
//! API.

use crate::account::models::NewAccount;
use std::fmt;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for account inputs
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("PIN must be 4-6 numeric digits")]
    PinFormat,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Source and destination accounts are the same")]
    SameAccount,
}

// ============================================================================
// Pin - Validated PIN (Private Field)
// ============================================================================

/// Validated PIN (guaranteed 4-6 ASCII digits).
///
/// Fields are private to force validation through `new()`. The Debug impl
/// redacts the digits so a PIN can never leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Create a new validated Pin
    ///
    /// # Validation Rules
    /// - 4 to 6 characters
    /// - ASCII digits only
    ///
    /// # Errors
    /// Returns `ValidationError::PinFormat` if validation fails
    pub fn new(pin: &str) -> Result<Self, ValidationError> {
        if pin.len() < 4 || pin.len() > 6 {
            return Err(ValidationError::PinFormat);
        }
        if !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PinFormat);
        }
        Ok(Self(pin.to_string()))
    }

    /// Get the validated PIN as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin(****)")
    }
}

// ============================================================================
// Profile validation
// ============================================================================

/// Check the required identity fields of a new account.
pub fn validate_new_account(new: &NewAccount) -> Result<(), ValidationError> {
    if new.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    if let Some(email) = &new.email {
        if email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_valid() {
        assert!(Pin::new("1234").is_ok());
        assert!(Pin::new("12345").is_ok());
        assert!(Pin::new("123456").is_ok());
        assert!(Pin::new("0000").is_ok());
    }

    #[test]
    fn test_pin_invalid_length() {
        assert_eq!(Pin::new("123").unwrap_err(), ValidationError::PinFormat);
        assert_eq!(Pin::new("1234567").unwrap_err(), ValidationError::PinFormat);
        assert_eq!(Pin::new("").unwrap_err(), ValidationError::PinFormat);
    }

    #[test]
    fn test_pin_digits_only() {
        assert_eq!(Pin::new("12a4").unwrap_err(), ValidationError::PinFormat);
        assert_eq!(Pin::new("12 4").unwrap_err(), ValidationError::PinFormat);
        assert_eq!(Pin::new("-123").unwrap_err(), ValidationError::PinFormat);
        // Unicode digits are rejected, ASCII only
        assert_eq!(Pin::new("١٢٣٤").unwrap_err(), ValidationError::PinFormat);
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::new("9876").unwrap();
        assert_eq!(format!("{:?}", pin), "Pin(****)");
    }

    #[test]
    fn test_new_account_requires_name() {
        let mut new = NewAccount::new("Alice");
        assert!(validate_new_account(&new).is_ok());

        new.name = "   ".to_string();
        assert_eq!(
            validate_new_account(&new).unwrap_err(),
            ValidationError::MissingField("name")
        );
    }

    #[test]
    fn test_new_account_rejects_blank_email() {
        let mut new = NewAccount::new("Bob");
        new.email = Some("".to_string());
        assert_eq!(
            validate_new_account(&new).unwrap_err(),
            ValidationError::MissingField("email")
        );
    }
}
