//! Transfer engine: deposit, withdraw and two-account transfer.
//!
//! Every operation follows the same shape: validate the amount, open one
//! transaction, take row locks, check lock flags and balances, apply the
//! balance change, append ledger rows, commit. Nothing is observable until
//! the commit; an error at any step drops the transaction and rolls back.
//!
//! The lock flag is re-checked inside the UPDATE that applies the balance
//! change (`AND is_locked = FALSE`), not only at validation time, so a lock
//! set by a concurrent failed-PIN strike cannot be ignored mid-operation.

use crate::account::models::TxKind;
use crate::account::validation::ValidationError;
use crate::db::Database;
use crate::error::BankError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Row, Transaction};

/// Stateless transfer engine over the shared ledger store. Concurrency
/// correctness is delegated to PostgreSQL row locks: each operation's
/// read-then-write sequence for an account happens under `FOR UPDATE`.
pub struct TransferEngine;

impl TransferEngine {
    /// Deposit into a USER account. Returns the new balance.
    ///
    /// Atomically: account balance += amount, system funds += amount, one
    /// Deposit ledger row with `balance_after` = new balance.
    pub async fn deposit(
        db: &Database,
        account_id: i64,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<Decimal, BankError> {
        let amount = positive_amount(amount)?;
        let mut tx = db.pool().begin().await?;

        let state = lock_account_row(&mut tx, account_id).await?;
        if state.is_locked {
            return Err(BankError::AccountLocked(account_id));
        }

        let new_balance = apply_credit(&mut tx, account_id, amount)
            .await?
            .ok_or(BankError::AccountLocked(account_id))?;

        sqlx::query("UPDATE system_funds SET balance = balance + $1 WHERE id = 1")
            .bind(amount)
            .execute(&mut *tx)
            .await?;

        append_ledger_row(
            &mut tx,
            account_id,
            TxKind::Deposit,
            amount,
            new_balance,
            note.unwrap_or("Deposit"),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(account_id, %amount, %new_balance, "deposit applied");
        Ok(new_balance)
    }

    /// Withdraw from a USER account. Returns the new balance.
    ///
    /// Fails with `InsufficientFunds` when `amount > balance`; the balance
    /// guard is repeated in the UPDATE itself so the account can never go
    /// negative even under concurrent withdrawals.
    pub async fn withdraw(
        db: &Database,
        account_id: i64,
        amount: Decimal,
        note: Option<&str>,
    ) -> Result<Decimal, BankError> {
        let amount = positive_amount(amount)?;
        let mut tx = db.pool().begin().await?;

        let state = lock_account_row(&mut tx, account_id).await?;
        if state.is_locked {
            return Err(BankError::AccountLocked(account_id));
        }
        if state.balance < amount {
            return Err(BankError::InsufficientFunds);
        }

        let new_balance = apply_debit(&mut tx, account_id, amount)
            .await?
            .ok_or(BankError::InsufficientFunds)?;

        sqlx::query("UPDATE system_funds SET balance = balance - $1 WHERE id = 1")
            .bind(amount)
            .execute(&mut *tx)
            .await?;

        append_ledger_row(
            &mut tx,
            account_id,
            TxKind::Withdraw,
            amount,
            new_balance,
            note.unwrap_or("Withdrawal"),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(account_id, %amount, %new_balance, "withdrawal applied");
        Ok(new_balance)
    }

    /// Transfer between two USER accounts. Returns
    /// `(new_source_balance, new_destination_balance)`.
    ///
    /// The only two-account operation: both rows are locked `FOR UPDATE` in
    /// ascending account-id order (so two opposite-direction transfers
    /// cannot deadlock), validated together, then both balances and exactly
    /// two ledger rows are written before the single commit. Any failure
    /// rolls the whole scope back: never one orphan ledger row, never a
    /// half-applied balance change.
    pub async fn transfer(
        db: &Database,
        from_id: i64,
        to_id: i64,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), BankError> {
        let amount = positive_amount(amount)?;
        if from_id == to_id {
            return Err(ValidationError::SameAccount.into());
        }

        let mut tx = db.pool().begin().await?;

        let rows = sqlx::query(
            "SELECT account_id, balance, is_locked FROM accounts \
             WHERE account_id = ANY($1) AND role = 'USER' \
             ORDER BY account_id \
             FOR UPDATE",
        )
        .bind(vec![from_id, to_id])
        .fetch_all(&mut *tx)
        .await?;

        let find = |id: i64| {
            rows.iter()
                .find(|r| r.get::<i64, _>("account_id") == id)
                .map(|r| AccountState {
                    balance: r.get("balance"),
                    is_locked: r.get("is_locked"),
                })
        };
        let source = find(from_id).ok_or(BankError::NotFound(from_id))?;
        let dest = find(to_id).ok_or(BankError::NotFound(to_id))?;

        if source.is_locked {
            return Err(BankError::SourceLocked(from_id));
        }
        if dest.is_locked {
            return Err(BankError::DestinationLocked(to_id));
        }
        if source.balance < amount {
            return Err(BankError::InsufficientFunds);
        }

        let new_from = apply_debit(&mut tx, from_id, amount)
            .await?
            .ok_or(BankError::SourceLocked(from_id))?;
        let new_to = apply_credit(&mut tx, to_id, amount)
            .await?
            .ok_or(BankError::DestinationLocked(to_id))?;

        append_ledger_row(
            &mut tx,
            from_id,
            TxKind::TransferOut,
            amount,
            new_from,
            &format!("Transfer to {}", to_id),
        )
        .await?;
        append_ledger_row(
            &mut tx,
            to_id,
            TxKind::TransferIn,
            amount,
            new_to,
            &format!("Transfer from {}", from_id),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(from_id, to_id, %amount, %new_from, %new_to, "transfer applied");
        Ok((new_from, new_to))
    }
}

struct AccountState {
    balance: Decimal,
    is_locked: bool,
}

/// Normalize an amount to the ledger's two-decimal scale, rejecting
/// non-positive values (including values that round down to zero).
fn positive_amount(amount: Decimal) -> Result<Decimal, BankError> {
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount);
    }
    let amount = amount.round_dp(2);
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount);
    }
    Ok(amount)
}

/// Take the row lock on a USER account and read its state.
async fn lock_account_row(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
) -> Result<AccountState, BankError> {
    let row = sqlx::query(
        "SELECT balance, is_locked FROM accounts \
         WHERE account_id = $1 AND role = 'USER' \
         FOR UPDATE",
    )
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BankError::NotFound(account_id))?;

    Ok(AccountState {
        balance: row.get("balance"),
        is_locked: row.get("is_locked"),
    })
}

/// Credit an account, re-checking the lock flag in the same statement.
/// Returns the new balance, or None when the guard rejected the update.
async fn apply_credit(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    amount: Decimal,
) -> Result<Option<Decimal>, BankError> {
    let row = sqlx::query(
        "UPDATE accounts SET balance = balance + $1 \
         WHERE account_id = $2 AND is_locked = FALSE \
         RETURNING balance",
    )
    .bind(amount)
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|r| r.get("balance")))
}

/// Debit an account; the guard re-checks both the lock flag and the balance.
async fn apply_debit(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    amount: Decimal,
) -> Result<Option<Decimal>, BankError> {
    let row = sqlx::query(
        "UPDATE accounts SET balance = balance - $1 \
         WHERE account_id = $2 AND is_locked = FALSE AND balance >= $1 \
         RETURNING balance",
    )
    .bind(amount)
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|r| r.get("balance")))
}

/// Append one immutable ledger row.
async fn append_ledger_row(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    kind: TxKind,
    amount: Decimal,
    balance_after: Decimal,
    note: &str,
) -> Result<(), BankError> {
    sqlx::query(
        "INSERT INTO transactions (account_id, kind, amount, balance_after, note) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(account_id)
    .bind(kind.as_str())
    .bind(amount)
    .bind(balance_after)
    .bind(note)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_rejects_zero_and_negative() {
        assert!(matches!(
            positive_amount(Decimal::ZERO),
            Err(BankError::InvalidAmount)
        ));
        assert!(matches!(
            positive_amount(dec!(-5)),
            Err(BankError::InvalidAmount)
        ));
    }

    #[test]
    fn test_positive_amount_rescales() {
        assert_eq!(positive_amount(dec!(10)).unwrap(), dec!(10));
        assert_eq!(positive_amount(dec!(10.005)).unwrap(), dec!(10.00));
        assert_eq!(positive_amount(dec!(10.015)).unwrap(), dec!(10.02));
    }

    #[test]
    fn test_positive_amount_rejects_dust_that_rounds_to_zero() {
        assert!(matches!(
            positive_amount(dec!(0.001)),
            Err(BankError::InvalidAmount)
        ));
    }
}
