//! Process-wide sharing of DuckDB database files
//!
//! Two `Connection::open` calls on one file in the same process produce two
//! independent databases, and whichever closes last overwrites the other's
//! commits. Every handle on a file therefore goes through [`open_shared`],
//! which keeps one root connection per canonical path and hands out
//! `try_clone`s of it for as long as any holder is alive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::Duration;

use duckdb::Connection;

use crate::domain::result::{Error, Result};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

static OPEN_DATABASES: OnceLock<Mutex<HashMap<PathBuf, Weak<SharedDatabase>>>> = OnceLock::new();

/// One open database file, shared by every handle in the process
pub struct SharedDatabase {
    root: Mutex<Connection>,
    path: PathBuf,
}

impl SharedDatabase {
    /// A new connection to the same database
    pub fn connect(&self) -> Result<Connection> {
        let root = self
            .root
            .lock()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        Ok(root.try_clone()?)
    }

    /// Canonical path the database is registered under
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Get the shared database for `path`, opening it if no handle is alive.
///
/// `init` runs once on the fresh root connection (migrations go here) while
/// the registry is locked, so two first openers never race on the schema.
pub fn open_shared<F>(path: &Path, init: F) -> Result<Arc<SharedDatabase>>
where
    F: FnOnce(&Connection) -> Result<()>,
{
    let key = canonical_key(path);
    let mut open = OPEN_DATABASES
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|e| Error::LockPoisoned(e.to_string()))?;

    open.retain(|_, db| db.strong_count() > 0);
    if let Some(db) = open.get(&key).and_then(Weak::upgrade) {
        tracing::debug!(path = %key.display(), "reusing open database");
        return Ok(db);
    }

    let root = open_with_retry(path)?;
    init(&root)?;

    let db = Arc::new(SharedDatabase {
        root: Mutex::new(root),
        path: key.clone(),
    });
    open.insert(key, Arc::downgrade(&db));
    Ok(db)
}

/// Canonical form of a path whose file may not exist yet
fn canonical_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Open `path`, retrying with exponential backoff while another process
/// holds the file lock
fn open_with_retry(path: &Path) -> Result<Connection> {
    let mut attempt = 0;
    loop {
        match try_open_connection(path) {
            Ok(conn) => return Ok(conn),
            Err(e) if is_retryable_error(&e.to_string()) && attempt < MAX_RETRIES - 1 => {
                let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    path = %path.display(),
                    attempt = attempt + 1,
                    max = MAX_RETRIES,
                    error = %e,
                    "database busy, retrying in {}ms",
                    delay.as_millis()
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn try_open_connection(path: &Path) -> duckdb::Result<Connection> {
    // Extension autoloading stays off; nothing here needs one
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Connection::open_with_flags(path, config)
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_same_path_shares_one_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.duckdb");

        let a = open_shared(&path, |_| Ok(())).unwrap();
        let b = open_shared(&dir.path().join(".").join("shared.duckdb"), |_| {
            panic!("init must not run for an already open database")
        })
        .unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.connect()
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();
        let seen: i64 = b
            .connect()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_database_reopens_after_last_handle_drops() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cycle.duckdb");

        let first = open_shared(&path, |_| Ok(())).unwrap();
        drop(first);

        let mut ran = false;
        let _second = open_shared(&path, |_| {
            ran = true;
            Ok(())
        })
        .unwrap();
        assert!(ran);
    }

    #[test]
    fn test_canonical_key_for_missing_file() {
        let dir = tempdir().unwrap();
        let key = canonical_key(&dir.path().join("missing.duckdb"));
        assert_eq!(
            key,
            dir.path().canonicalize().unwrap().join("missing.duckdb")
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: Could not set lock on file"));
        assert!(is_retryable_error("database is locked"));
        assert!(!is_retryable_error("Constraint Error: NOT NULL constraint failed"));
    }
}
