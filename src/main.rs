//! Provisioning entry point.
//!
//! Operators run this once per environment: it connects to the store,
//! creates the schema if missing (safe no-op otherwise) and bootstraps the
//! single ADMIN account with an operator-supplied PIN.
//!
//! ```text
//! BANK_ADMIN_PIN=... provision --env prod
//! ```

use anyhow::{Context, Result};
use bankledger::account::AccountService;
use bankledger::config::AppConfig;
use bankledger::db::Database;
use bankledger::logging::init_logging;
use bankledger::schema::init_schema;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env = %env, "provisioning the ledger store");

    let db = Database::connect(&config.database_url())
        .await
        .context("failed to connect to the ledger store")?;

    init_schema(db.pool())
        .await
        .context("schema initialization failed")?;

    let bootstrap_pin = config.admin_bootstrap_pin().context(
        "no admin bootstrap PIN supplied: set BANK_ADMIN_PIN or admin.bootstrap_pin in the config",
    )?;

    let admin_id = AccountService::ensure_admin_account(&db, &bootstrap_pin)
        .await
        .context("admin bootstrap failed")?;

    tracing::info!(admin_id, "ledger store provisioned");
    Ok(())
}
