//! Bootstrap utilities for salesdb binaries.
//!
//! Shared initialization code: logging and database pool setup.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{StorageConfig, LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};

/// Initialize tracing with SALESDB_LOG environment variable.
///
/// Defaults to "info" level if SALESDB_LOG is not set. Set
/// SALESDB_LOG_FORMAT=json for structured output.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Open a SQLite pool for the configured database.
///
/// Foreign keys are enabled on every connection; the normalized and star
/// schemas depend on them. An in-memory database is capped at one
/// connection, otherwise each connection would see its own empty database.
pub async fn connect_pool(config: &StorageConfig) -> Result<SqlitePool, sqlx::Error> {
    let (opts, max_connections) = if config.is_in_memory() {
        (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
    } else {
        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let opts = SqliteConnectOptions::new()
            .filename(&config.path)
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);
        (opts, config.max_connections.max(1))
    };

    let opts = opts
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    info!(path = %config.path, max_connections, "opening sales database");

    let mut pool = SqlitePoolOptions::new().max_connections(max_connections);
    if config.is_in_memory() {
        // Closing the only connection would drop the database with it.
        pool = pool.idle_timeout(None).max_lifetime(None);
    }
    pool.connect_with(opts).await
}
