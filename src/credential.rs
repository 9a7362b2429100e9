//! Credential Verifier: one-way PIN hashing and comparison.
//!
//! The ledger never stores or logs a raw PIN; only the salted argon2 digest
//! is persisted. Verification failures are reported as a plain `false` so
//! the caller decides how to surface them.

use crate::error::BankError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a PIN into a salted PHC string suitable for the `pin_hash` column.
pub fn hash_pin(pin: &str) -> Result<String, BankError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| BankError::Hashing(e.to_string()))
}

/// Compare a candidate PIN against a stored digest.
pub fn verify_pin(pin: &str, pin_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(pin_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let digest = hash_pin("4321").expect("hashing should succeed");
        assert!(verify_pin("4321", &digest));
        assert!(!verify_pin("1234", &digest));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_pin("4321").unwrap();
        let b = hash_pin("4321").unwrap();
        assert_ne!(a, b, "same PIN must hash to different digests");
    }

    #[test]
    fn test_verify_rejects_garbage_digest() {
        assert!(!verify_pin("4321", "not-a-phc-string"));
    }
}
