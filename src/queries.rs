//! Query layer: transaction history and admin reporting.
//!
//! Pure reads with no locking beyond standard read consistency; every
//! function is side-effect free and safe to re-call.

use crate::account::models::Transaction;
use crate::error::BankError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Row};

/// Default page size for history queries.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;
/// Hard cap regardless of what the caller asks for.
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// An account's ledger, newest first, truncated at `limit`
/// (default 100, capped at 200).
pub async fn account_transactions(
    pool: &PgPool,
    account_id: i64,
    limit: Option<i64>,
) -> Result<Vec<Transaction>, BankError> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows: Vec<Transaction> = sqlx::query_as(
        "SELECT tx_id, account_id, kind, amount, balance_after, note, created_at \
         FROM transactions \
         WHERE account_id = $1 \
         ORDER BY created_at DESC, tx_id DESC \
         LIMIT $2",
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
}

/// USER count plus lifetime Deposit / Withdraw sums.
pub async fn admin_stats(pool: &PgPool) -> Result<AdminStats, BankError> {
    let total_users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = 'USER'")
            .fetch_one(pool)
            .await?;

    let total_deposits: Option<Decimal> =
        sqlx::query_scalar("SELECT SUM(amount) FROM transactions WHERE kind = 'Deposit'")
            .fetch_one(pool)
            .await?;

    let total_withdrawals: Option<Decimal> =
        sqlx::query_scalar("SELECT SUM(amount) FROM transactions WHERE kind = 'Withdraw'")
            .fetch_one(pool)
            .await?;

    Ok(AdminStats {
        total_users,
        total_deposits: total_deposits.unwrap_or(Decimal::ZERO),
        total_withdrawals: total_withdrawals.unwrap_or(Decimal::ZERO),
    })
}

/// Current bank-wide aggregate balance.
pub async fn system_funds_balance(pool: &PgPool) -> Result<Decimal, BankError> {
    let balance: Decimal = sqlx::query_scalar("SELECT balance FROM system_funds WHERE id = 1")
        .fetch_one(pool)
        .await?;
    Ok(balance)
}

/// One row of the admin user listing.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub account_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub is_locked: bool,
}

/// All USER accounts ordered by id, without credential data.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>, BankError> {
    let rows = sqlx::query(
        "SELECT account_id, name, email, phone, balance, is_locked \
         FROM accounts \
         WHERE role = 'USER' \
         ORDER BY account_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| UserSummary {
            account_id: r.get("account_id"),
            name: r.get("name"),
            email: r.get("email"),
            phone: r.get("phone"),
            balance: r.get("balance"),
            is_locked: r.get("is_locked"),
        })
        .collect())
}

/// Ledger row joined with the owning account's name, for the admin view.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub tx_id: i64,
    pub account_id: i64,
    pub account_name: String,
    pub kind: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Every USER transaction, newest first.
pub async fn all_transactions(pool: &PgPool, limit: i64) -> Result<Vec<LedgerEntry>, BankError> {
    let rows = sqlx::query(
        "SELECT t.tx_id, t.account_id, a.name, t.kind, t.amount, t.balance_after, \
                t.note, t.created_at \
         FROM transactions t \
         JOIN accounts a ON t.account_id = a.account_id \
         WHERE a.role = 'USER' \
         ORDER BY t.created_at DESC, t.tx_id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| LedgerEntry {
            tx_id: r.get("tx_id"),
            account_id: r.get("account_id"),
            account_name: r.get("name"),
            kind: r.get("kind"),
            amount: r.get("amount"),
            balance_after: r.get("balance_after"),
            note: r.get("note"),
            created_at: r.get("created_at"),
        })
        .collect())
}
