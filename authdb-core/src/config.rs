//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "store": { "dbFile": "authdb.duckdb", "echoSql": false, "resetOnOpen": false }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapters::duckdb::StoreOptions;
use crate::domain::result::{Error, Result};

/// Default database file name inside the data directory
pub const DEFAULT_DB_FILE: &str = "authdb.duckdb";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    store: StoreSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    db_file: Option<String>,
    #[serde(default)]
    echo_sql: bool,
    #[serde(default)]
    reset_on_open: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// authdb configuration (settings file plus environment overrides)
#[derive(Debug, Clone)]
pub struct Config {
    /// Store database file, relative to the data directory unless absolute
    pub db_file: String,
    pub echo_sql: bool,
    pub reset_on_open: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: DEFAULT_DB_FILE.to_string(),
            echo_sql: false,
            reset_on_open: false,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment variables override the file:
    /// `AUTHDB_DB_FILE`, `AUTHDB_ECHO_SQL`, `AUTHDB_RESET_ON_OPEN`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(data_dir)?;

        let db_file = match std::env::var("AUTHDB_DB_FILE") {
            Ok(file) if !file.trim().is_empty() => file,
            _ => raw
                .store
                .db_file
                .clone()
                .unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
        };
        let echo_sql = bool_env("AUTHDB_ECHO_SQL")?.unwrap_or(raw.store.echo_sql);
        let reset_on_open = bool_env("AUTHDB_RESET_ON_OPEN")?.unwrap_or(raw.store.reset_on_open);

        Ok(Self {
            db_file,
            echo_sql,
            reset_on_open,
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving settings we don't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;

        settings.store.db_file = Some(self.db_file.clone());
        settings.store.echo_sql = self.echo_sql;
        settings.store.reset_on_open = self.reset_on_open;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    /// Absolute path of the store database
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        let file = Path::new(&self.db_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            echo_sql: self.echo_sql,
            reset_on_open: self.reset_on_open,
        }
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join(SETTINGS_FILE);
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("invalid {}: {}", settings_path.display(), e))
    })
}

fn bool_env(name: &str) -> Result<Option<bool>> {
    match std::env::var(name).ok().as_deref() {
        None | Some("") => Ok(None),
        Some("true" | "1" | "yes" | "TRUE" | "YES") => Ok(Some(true)),
        Some("false" | "0" | "no" | "FALSE" | "NO") => Ok(Some(false)),
        Some(other) => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
