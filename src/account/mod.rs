//! Account management module
//!
//! PostgreSQL-backed storage for accounts: typed records, input validation,
//! row access and the lifecycle service.

pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod validation;

// Re-export commonly used types
pub use lifecycle::{AccountService, MAX_FAILED_ATTEMPTS};
pub use models::{Account, KycDetails, NewAccount, Role, Transaction, TxKind};
pub use repository::AccountRepository;
pub use validation::{Pin, ValidationError};

// Re-export Database from top-level db module
pub use crate::db::Database;
