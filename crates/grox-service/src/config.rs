//! Service configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `GROX_DATABASE_PATH`          | `./grox.db`      |
//! | `GROX_DB_MAX_CONNECTIONS`     | `5`              |
//! | `GROX_INVOICE_SEQUENCE_KEY`   | `sales.invoice`  |
//! | `GROX_LEDGER_BALANCE_POLICY`  | `allow_negative` |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use grox_core::ledger::BalancePolicy;
use grox_core::DEFAULT_INVOICE_SEQUENCE_KEY;
use grox_db::DbConfig;

/// Grox service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroxConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Counter key invoice numbers are drawn from
    pub invoice_sequence_key: String,

    /// Running-balance policy for ledger replay
    pub ledger_balance_policy: BalancePolicy,
}

impl GroxConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = GroxConfig {
            database_path: lookup("GROX_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./grox.db")),

            max_connections: lookup("GROX_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GROX_DB_MAX_CONNECTIONS".to_string()))?,

            invoice_sequence_key: lookup("GROX_INVOICE_SEQUENCE_KEY")
                .unwrap_or_else(|| DEFAULT_INVOICE_SEQUENCE_KEY.to_string())
                .trim()
                .to_string(),

            ledger_balance_policy: match lookup("GROX_LEDGER_BALANCE_POLICY") {
                Some(raw) => raw.parse().map_err(|_| {
                    ConfigError::InvalidValue("GROX_LEDGER_BALANCE_POLICY".to_string())
                })?,
                None => BalancePolicy::default(),
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("GROX_DB_MAX_CONNECTIONS".to_string()));
        }

        if config.invoice_sequence_key.is_empty() {
            return Err(ConfigError::MissingRequired(
                "GROX_INVOICE_SEQUENCE_KEY".to_string(),
            ));
        }

        Ok(config)
    }

    /// In-memory database with defaults (for tests).
    pub fn in_memory() -> Self {
        GroxConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            invoice_sequence_key: DEFAULT_INVOICE_SEQUENCE_KEY.to_string(),
            ledger_balance_policy: BalancePolicy::default(),
        }
    }

    /// Pool configuration for grox-db.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
