//! Account lifecycle operations
//!
//! Creation, lookup, admin bootstrap, authentication with failed-attempt
//! lockout, PIN changes and deletion. Every multi-statement mutation runs in
//! one transaction scope; on any error path the scope is dropped and rolled
//! back before the error reaches the caller.

use super::models::{Account, NewAccount, TxKind};
use super::repository::AccountRepository;
use super::validation::{self, Pin};
use crate::credential;
use crate::db::Database;
use crate::error::BankError;
use rust_decimal::Decimal;
use sqlx::Row;

/// Failed PIN verifications before an account locks.
pub const MAX_FAILED_ATTEMPTS: i32 = 3;

/// Stateless lifecycle service. Lock toggling and deletion are admin-only
/// operations; the transport layer is responsible for gating them behind
/// [`AccountService::authenticate_admin`].
pub struct AccountService;

impl AccountService {
    /// Create a new USER account.
    ///
    /// The PIN is hashed before storage, the raw PIN is never persisted.
    /// With `initial_deposit > 0` the account row, one Deposit ledger row
    /// (`balance_after == initial_deposit`, note "Initial deposit") and the
    /// system-funds credit are committed as a single unit; a failure leaves
    /// no trace of the account.
    pub async fn create_account(
        db: &Database,
        new: &NewAccount,
        pin: &str,
        initial_deposit: Decimal,
    ) -> Result<i64, BankError> {
        let pin = Pin::new(pin)?;
        validation::validate_new_account(new)?;
        if initial_deposit < Decimal::ZERO {
            return Err(BankError::InvalidAmount);
        }
        let initial = initial_deposit.round_dp(2);
        let pin_hash = credential::hash_pin(pin.as_str())?;

        let mut tx = db.pool().begin().await?;

        let row = sqlx::query(
            r#"INSERT INTO accounts
                   (name, email, phone, balance, pin_hash, role,
                    dob, gender, id_type, id_document, address, city, state, pincode, account_type)
               VALUES ($1, $2, $3, $4, $5, 'USER', $6, $7, $8, $9, $10, $11, $12, $13, $14)
               RETURNING account_id"#,
        )
        .bind(new.name.trim())
        .bind(&new.email)
        .bind(&new.phone)
        .bind(initial)
        .bind(&pin_hash)
        .bind(&new.kyc.dob)
        .bind(&new.kyc.gender)
        .bind(&new.kyc.id_type)
        .bind(&new.kyc.id_document)
        .bind(&new.kyc.address)
        .bind(&new.kyc.city)
        .bind(&new.kyc.state)
        .bind(&new.kyc.pincode)
        .bind(&new.kyc.account_type)
        .fetch_one(&mut *tx)
        .await?;
        let account_id: i64 = row.get("account_id");

        if initial > Decimal::ZERO {
            sqlx::query(
                "INSERT INTO transactions (account_id, kind, amount, balance_after, note)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(account_id)
            .bind(TxKind::Deposit.as_str())
            .bind(initial)
            .bind(initial)
            .bind("Initial deposit")
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE system_funds SET balance = balance + $1 WHERE id = 1")
                .bind(initial)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(account_id, %initial, "account created");
        Ok(account_id)
    }

    /// Get a USER account by id. The ADMIN row is never returned.
    pub async fn get_account(db: &Database, account_id: i64) -> Result<Account, BankError> {
        AccountRepository::get_by_id(db.pool(), account_id)
            .await?
            .ok_or(BankError::NotFound(account_id))
    }

    /// Get a USER account by email.
    pub async fn get_account_by_email(
        db: &Database,
        email: &str,
    ) -> Result<Option<Account>, BankError> {
        Ok(AccountRepository::get_by_email(db.pool(), email).await?)
    }

    /// Bootstrap the single ADMIN account. Idempotent: if an ADMIN row
    /// already exists its id is returned and nothing changes. The bootstrap
    /// PIN is operator-supplied, never hardcoded.
    pub async fn ensure_admin_account(db: &Database, bootstrap_pin: &str) -> Result<i64, BankError> {
        let pin = Pin::new(bootstrap_pin)?;

        if let Some(admin_id) = AccountRepository::admin_id(db.pool()).await? {
            tracing::debug!(admin_id, "admin account already bootstrapped");
            return Ok(admin_id);
        }

        let pin_hash = credential::hash_pin(pin.as_str())?;

        // Guarded insert: two concurrent bootstraps cannot both pass the
        // NOT EXISTS check and commit a second ADMIN row.
        let inserted = sqlx::query(
            r#"INSERT INTO accounts (name, email, balance, pin_hash, role)
               SELECT 'Administrator', 'admin@bank.local', 0, $1, 'ADMIN'
               WHERE NOT EXISTS (SELECT 1 FROM accounts WHERE role = 'ADMIN')
               RETURNING account_id"#,
        )
        .bind(&pin_hash)
        .fetch_optional(db.pool())
        .await?;

        match inserted {
            Some(row) => {
                let admin_id: i64 = row.get("account_id");
                tracing::info!(admin_id, "admin account bootstrapped");
                Ok(admin_id)
            }
            None => {
                // Lost the race; the winner's row is the admin.
                AccountRepository::admin_id(db.pool())
                    .await?
                    .ok_or(BankError::NotFound(0))
            }
        }
    }

    /// Verify a USER account's PIN.
    ///
    /// A locked account is rejected before the digest is even compared.
    /// A mismatch increments the failed-attempt counter (locking the account
    /// on the third strike) and surfaces only "invalid credential". A match
    /// resets the counter.
    pub async fn authenticate(db: &Database, account_id: i64, pin: &str) -> Result<(), BankError> {
        let Some((pin_hash, is_locked)) =
            AccountRepository::credential_by_id(db.pool(), account_id).await?
        else {
            return Err(BankError::NotFound(account_id));
        };

        if is_locked {
            return Err(BankError::AccountLocked(account_id));
        }

        if credential::verify_pin(pin, &pin_hash) {
            Self::reset_failed_attempts(db, account_id).await?;
            Ok(())
        } else {
            let (attempts, now_locked) = Self::register_failed_attempt(db, account_id).await?;
            tracing::warn!(account_id, attempts, now_locked, "PIN verification failed");
            Err(BankError::InvalidCredential)
        }
    }

    /// Verify the ADMIN PIN. Does not participate in the lockout policy.
    pub async fn authenticate_admin(db: &Database, pin: &str) -> Result<i64, BankError> {
        let Some(admin_id) = AccountRepository::admin_id(db.pool()).await? else {
            return Err(BankError::InvalidCredential);
        };
        let Some(pin_hash) = AccountRepository::credential_any_role(db.pool(), admin_id).await?
        else {
            return Err(BankError::InvalidCredential);
        };

        if credential::verify_pin(pin, &pin_hash) {
            Ok(admin_id)
        } else {
            Err(BankError::InvalidCredential)
        }
    }

    /// Change an account's PIN after verifying the old one. Works for the
    /// ADMIN row too (admin PIN rotation).
    pub async fn change_pin(
        db: &Database,
        account_id: i64,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<(), BankError> {
        let new_pin = Pin::new(new_pin)?;

        let Some(pin_hash) = AccountRepository::credential_any_role(db.pool(), account_id).await?
        else {
            return Err(BankError::NotFound(account_id));
        };
        if !credential::verify_pin(old_pin, &pin_hash) {
            return Err(BankError::InvalidCredential);
        }

        let new_hash = credential::hash_pin(new_pin.as_str())?;
        sqlx::query("UPDATE accounts SET pin_hash = $1 WHERE account_id = $2")
            .bind(&new_hash)
            .bind(account_id)
            .execute(db.pool())
            .await?;

        tracing::info!(account_id, "PIN changed");
        Ok(())
    }

    /// Record a failed PIN verification. The increment and the lock flip are
    /// one statement, so there is no durable window where `failed_attempts`
    /// reached the limit but `is_locked` is still false.
    ///
    /// Returns `(failed_attempts, is_locked)` after the update.
    pub async fn register_failed_attempt(
        db: &Database,
        account_id: i64,
    ) -> Result<(i32, bool), BankError> {
        let row = sqlx::query(
            r#"UPDATE accounts
               SET failed_attempts = failed_attempts + 1,
                   is_locked = is_locked OR failed_attempts + 1 >= $1
               WHERE account_id = $2 AND role = 'USER'
               RETURNING failed_attempts, is_locked"#,
        )
        .bind(MAX_FAILED_ATTEMPTS)
        .bind(account_id)
        .fetch_optional(db.pool())
        .await?
        .ok_or(BankError::NotFound(account_id))?;

        Ok((row.get("failed_attempts"), row.get("is_locked")))
    }

    /// Zero the failed-attempt counter (called on successful authentication).
    pub async fn reset_failed_attempts(db: &Database, account_id: i64) -> Result<(), BankError> {
        sqlx::query("UPDATE accounts SET failed_attempts = 0 WHERE account_id = $1")
            .bind(account_id)
            .execute(db.pool())
            .await?;
        Ok(())
    }

    /// Lock a USER account.
    pub async fn lock_account(db: &Database, account_id: i64) -> Result<(), BankError> {
        let result = sqlx::query(
            "UPDATE accounts SET is_locked = TRUE WHERE account_id = $1 AND role = 'USER'",
        )
        .bind(account_id)
        .execute(db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(BankError::NotFound(account_id));
        }
        tracing::info!(account_id, "account locked");
        Ok(())
    }

    /// Unlock a USER account. Always zeroes the failed-attempt counter.
    pub async fn unlock_account(db: &Database, account_id: i64) -> Result<(), BankError> {
        let result = sqlx::query(
            "UPDATE accounts SET is_locked = FALSE, failed_attempts = 0 \
             WHERE account_id = $1 AND role = 'USER'",
        )
        .bind(account_id)
        .execute(db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(BankError::NotFound(account_id));
        }
        tracing::info!(account_id, "account unlocked");
        Ok(())
    }

    /// Permanently delete a USER account. The foreign-key cascade removes
    /// its ledger rows. Irreversible.
    pub async fn delete_account(db: &Database, account_id: i64) -> Result<(), BankError> {
        let result =
            sqlx::query("DELETE FROM accounts WHERE account_id = $1 AND role = 'USER'")
                .bind(account_id)
                .execute(db.pool())
                .await?;

        if result.rows_affected() == 0 {
            return Err(BankError::NotFound(account_id));
        }
        tracing::info!(account_id, "account deleted");
        Ok(())
    }
}
