//! bankledger - Account Ledger & Transfer Engine
//!
//! The correctness core of the banking management system: accounts, the
//! append-only transaction ledger and the transfer engine, backed by a
//! single PostgreSQL store.
//!
//! # Modules
//!
//! - [`db`] - Connection pool over the relational store
//! - [`schema`] - Idempotent schema initialization
//! - [`account`] - Typed records, validation and the lifecycle service
//! - [`credential`] - One-way PIN hashing (argon2)
//! - [`engine`] - Deposit / withdraw / transfer with atomic apply+log+commit
//! - [`queries`] - History retrieval and admin reporting
//! - [`error`] - The closed failure taxonomy callers match on
//!
//! Presentation layers (GUI, HTTP, CLI) are external: they call the services
//! here by value and receive either a result or a [`error::BankError`].

pub mod account;
pub mod config;
pub mod credential;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod queries;
pub mod schema;

// Convenient re-exports at crate root
pub use account::{
    Account, AccountService, KycDetails, NewAccount, Pin, Role, Transaction, TxKind,
    ValidationError,
};
pub use config::AppConfig;
pub use db::Database;
pub use engine::TransferEngine;
pub use error::BankError;
pub use logging::init_logging;
pub use schema::init_schema;
