//! authdb core - user-account storage for an authentication flow
//!
//! The crate follows a hexagonal layout:
//!
//! - **domain**: the `User` record, its field set and error types
//! - **ports**: the `UserRepository` trait callers program against
//! - **adapters**: the DuckDB implementation of that trait
//! - **services**: schema migrations and the event log
//!
//! Passwords arrive already hashed; this crate never hashes or verifies them.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};

use adapters::duckdb::DuckDbUserStore;
use config::Config;

// Re-export commonly used types at crate root
pub use adapters::duckdb::StoreOptions;
pub use domain::result::{Error, Result};
pub use domain::{Criteria, FieldValue, User, UserField, UserUpdate};
pub use ports::{ColumnInfo, UserRepository};
pub use services::{EntryPoint, LogEntry, LogEvent, LoggingService};

/// Main context for front ends
///
/// Loads configuration from a data directory and opens the store it names.
pub struct AuthDbContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: DuckDbUserStore,
}

impl AuthDbContext {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let db_path = config.db_path(data_dir);
        let store = DuckDbUserStore::open(&db_path, config.store_options())?;

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store,
        })
    }
}
