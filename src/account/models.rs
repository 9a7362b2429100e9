//! Data models for accounts and ledger rows

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use std::str::FromStr;

/// Account role. Exactly one ADMIN row exists per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl From<&str> for Role {
    fn from(v: &str) -> Self {
        match v {
            "ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TxKind {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "Deposit",
            TxKind::Withdraw => "Withdraw",
            TxKind::TransferOut => "Transfer-Out",
            TxKind::TransferIn => "Transfer-In",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(TxKind::Deposit),
            "Withdraw" => Ok(TxKind::Withdraw),
            "Transfer-Out" => Ok(TxKind::TransferOut),
            "Transfer-In" => Ok(TxKind::TransferIn),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

/// Optional KYC details captured at account opening. Orthogonal to balance
/// invariants; stored as-is and never validated beyond presence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KycDetails {
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub id_type: Option<String>,
    pub id_document: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub account_type: Option<String>,
}

/// Account row as exposed to callers. The `pin_hash` column is deliberately
/// absent: display layers never see the digest, authentication goes through
/// [`crate::account::AccountService::authenticate`].
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub account_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Decimal,
    pub role: Role,
    pub is_locked: bool,
    pub failed_attempts: i32,
    pub kyc: KycDetails,
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Account {
            account_id: row.try_get("account_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            balance: row.try_get("balance")?,
            role: Role::from(role.as_str()),
            is_locked: row.try_get("is_locked")?,
            failed_attempts: row.try_get("failed_attempts")?,
            kyc: KycDetails {
                dob: row.try_get("dob")?,
                gender: row.try_get("gender")?,
                id_type: row.try_get("id_type")?,
                id_document: row.try_get("id_document")?,
                address: row.try_get("address")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                pincode: row.try_get("pincode")?,
                account_type: row.try_get("account_type")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Immutable ledger row. Created once, never updated; deleted only by the
/// cascade when its account is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub tx_id: i64,
    pub account_id: i64,
    pub kind: TxKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for Transaction {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = kind.parse::<TxKind>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "kind".into(),
            source: e.into(),
        })?;
        Ok(Transaction {
            tx_id: row.try_get("tx_id")?,
            account_id: row.try_get("account_id")?,
            kind,
            amount: row.try_get("amount")?,
            balance_after: row.try_get("balance_after")?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Input record for account creation.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub kyc: KycDetails,
}

impl NewAccount {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: None,
            phone: None,
            kyc: KycDetails::default(),
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from("ADMIN"), Role::Admin);
        assert_eq!(Role::from("USER"), Role::User);
        assert_eq!(Role::from("anything-else"), Role::User); // default to User
    }

    #[test]
    fn test_tx_kind_round_trip() {
        for kind in [
            TxKind::Deposit,
            TxKind::Withdraw,
            TxKind::TransferOut,
            TxKind::TransferIn,
        ] {
            assert_eq!(kind.as_str().parse::<TxKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_tx_kind_rejects_unknown() {
        assert!("Refund".parse::<TxKind>().is_err());
        assert!("deposit".parse::<TxKind>().is_err()); // case sensitive
    }

    #[test]
    fn test_new_account_builder() {
        let new = NewAccount::new("Alice")
            .with_email("alice@example.com")
            .with_phone("555-0001");
        assert_eq!(new.name, "Alice");
        assert_eq!(new.email.as_deref(), Some("alice@example.com"));
        assert_eq!(new.phone.as_deref(), Some("555-0001"));
        assert!(new.kyc.dob.is_none());
    }
}
