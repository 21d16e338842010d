//! DuckDB user store implementation

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use duckdb::{params, Connection, Row};

use super::shared::{open_shared, SharedDatabase};
use crate::domain::result::{Error, Result};
use crate::domain::{Criteria, FieldValue, User, UserField, UserUpdate, USERS_TABLE};
use crate::ports::{ColumnInfo, UserRepository};
use crate::services::MigrationService;

const USER_COLUMNS: &str = "id, email, hashed_password, session_id, reset_token";

/// Behaviour switches for a store instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Emit every SQL statement at info level on the `authdb::sql` target
    pub echo_sql: bool,
    /// Wipe the users table right after opening. Development use only.
    pub reset_on_open: bool,
}

/// DuckDB-backed user store
///
/// Holds the connection opened at construction and a session connection
/// created from it on first use. Every operation after construction runs
/// on that one session. Stores opened on the same file in one process
/// share a single database, so their writes never shadow each other.
pub struct DuckDbUserStore {
    // Field order is drop order: session before conn before the database
    session: OnceLock<Mutex<Connection>>,
    conn: Mutex<Connection>,
    _database: Option<Arc<SharedDatabase>>,
    db_path: Option<PathBuf>,
    options: StoreOptions,
}

impl DuckDbUserStore {
    /// Open (or create) the store at `db_path` and apply pending migrations.
    ///
    /// Existing users are kept unless `options.reset_on_open` is set.
    /// Retries with exponential backoff while another process holds the
    /// database file lock.
    pub fn open(db_path: &Path, options: StoreOptions) -> Result<Self> {
        let database = open_shared(db_path, |root| {
            MigrationService::new(root).run_pending()?;
            Ok(())
        })?;
        let conn = database.connect()?;
        Self::init(conn, Some(database), Some(db_path.to_path_buf()), options)
    }

    /// Open a private in-memory store (tests, scratch use)
    pub fn open_in_memory(options: StoreOptions) -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        MigrationService::new(&conn).run_pending()?;
        Self::init(conn, None, None, options)
    }

    fn init(
        conn: Connection,
        database: Option<Arc<SharedDatabase>>,
        db_path: Option<PathBuf>,
        options: StoreOptions,
    ) -> Result<Self> {
        if options.reset_on_open {
            MigrationService::new(&conn).reset()?;
            tracing::warn!(path = ?db_path, "users table reset on open");
        }

        let store = Self {
            session: OnceLock::new(),
            conn: Mutex::new(conn),
            _database: database,
            db_path,
            options,
        };
        tracing::debug!(path = ?store.db_path, "user store opened");
        Ok(store)
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Whether the session connection has been created yet
    pub fn has_session(&self) -> bool {
        self.session.get().is_some()
    }

    /// The memoized session, created from the main connection on first use
    fn session(&self) -> Result<MutexGuard<'_, Connection>> {
        let session = match self.session.get() {
            Some(session) => session,
            None => {
                let conn = self
                    .conn
                    .lock()
                    .map_err(|e| Error::LockPoisoned(e.to_string()))?;
                let cloned = conn.try_clone()?;
                tracing::debug!("session created");
                self.session.get_or_init(|| Mutex::new(cloned))
            }
        };
        session.lock().map_err(|e| Error::LockPoisoned(e.to_string()))
    }

    fn echo(&self, sql: &str) {
        if self.options.echo_sql {
            tracing::info!(target: "authdb::sql", "{}", sql);
        }
    }

    /// Number of stored users
    pub fn count_users(&self) -> Result<i64> {
        let session = self.session()?;
        let sql = format!("SELECT COUNT(*) FROM {}", USERS_TABLE);
        self.echo(&sql);
        Ok(session.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Columns of the live users table, in declaration order
    pub fn schema_columns(&self) -> Result<Vec<ColumnInfo>> {
        let session = self.session()?;
        let sql = "SELECT column_name, data_type, is_nullable
                   FROM information_schema.columns
                   WHERE table_name = ?
                   ORDER BY ordinal_position";
        self.echo(sql);
        let mut stmt = session.prepare(sql)?;
        let rows = stmt.query_map([USERS_TABLE], |row| {
            let nullable: String = row.get(2)?;
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                nullable: nullable.eq_ignore_ascii_case("YES"),
            })
        })?;

        let mut columns = Vec::new();
        for column in rows {
            columns.push(column?);
        }
        Ok(columns)
    }

    fn select_user(conn: &Connection, sql: &str, criteria: &Criteria) -> Result<User> {
        let params: Vec<Box<dyn duckdb::ToSql>> = criteria
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(_, value)| to_param(value))
            .collect();
        let param_refs: Vec<&dyn duckdb::ToSql> = params.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn.prepare(sql)?;
        match stmt.query_row(param_refs.as_slice(), row_to_user) {
            Ok(user) => Ok(user),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(Error::not_found(format!(
                "no user matches {}",
                criteria
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

impl UserRepository for DuckDbUserStore {
    fn add_user(&self, email: &str, hashed_password: &str) -> Result<User> {
        let mut session = self.session()?;
        let sql = format!(
            "INSERT INTO {} (email, hashed_password) VALUES (?, ?) RETURNING {}",
            USERS_TABLE, USER_COLUMNS
        );
        self.echo(&sql);

        let tx = session.transaction()?;
        let user = tx.query_row(&sql, params![email, hashed_password], row_to_user)?;
        tx.commit()?;

        tracing::debug!(user_id = user.id, "user added");
        Ok(user)
    }

    fn find_user(&self, criteria: &Criteria) -> Result<User> {
        if criteria.is_empty() {
            return Err(Error::invalid_argument("no lookup criteria provided"));
        }
        let session = self.session()?;
        let sql = select_sql(criteria);
        self.echo(&sql);

        let user = Self::select_user(&session, &sql, criteria)?;
        tracing::debug!(user_id = user.id, criteria = %criteria, "user found");
        Ok(user)
    }

    fn update_user_fields(&self, user_id: i64, update: &UserUpdate) -> Result<()> {
        let mut session = self.session()?;
        let tx = session.transaction()?;

        let criteria = Criteria::by_id(user_id);
        let sql = select_sql(&criteria);
        self.echo(&sql);
        let user = Self::select_user(&tx, &sql, &criteria)?;

        if !update.is_empty() {
            let assignments: Vec<String> = update
                .iter()
                .map(|(field, _)| format!("{} = ?", field.column_name()))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?",
                USERS_TABLE,
                assignments.join(", ")
            );
            self.echo(&sql);

            let mut params: Vec<Box<dyn duckdb::ToSql>> =
                update.iter().map(|(_, value)| to_param(value)).collect();
            params.push(Box::new(user.id));
            let param_refs: Vec<&dyn duckdb::ToSql> =
                params.iter().map(|b| b.as_ref()).collect();

            // Dropping the transaction on error rolls every change back
            tx.execute(&sql, param_refs.as_slice())?;
        }
        tx.commit()?;

        tracing::debug!(user_id, fields = ?update.fields(), "user updated");
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let session = self.session()?;
        self.echo("-- reset users schema");
        MigrationService::new(&session).reset()?;
        tracing::warn!(path = ?self.db_path, "users table reset");
        Ok(())
    }
}

/// `SELECT ... WHERE a = ? AND b IS NULL ... ORDER BY id LIMIT 1`
fn select_sql(criteria: &Criteria) -> String {
    let conditions: Vec<String> = criteria
        .iter()
        .map(|(field, value)| {
            if value.is_null() {
                format!("{} IS NULL", field.column_name())
            } else {
                format!("{} = ?", field.column_name())
            }
        })
        .collect();
    format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT 1",
        USER_COLUMNS,
        USERS_TABLE,
        conditions.join(" AND "),
        UserField::Id.column_name()
    )
}

/// Convert a field value to a DuckDB parameter
fn to_param(value: &FieldValue) -> Box<dyn duckdb::ToSql> {
    match value {
        FieldValue::Integer(i) => Box::new(*i),
        FieldValue::Text(s) => Box::new(s.clone()),
        FieldValue::Null => Box::new(None::<String>),
    }
}

// Column order matches USER_COLUMNS
fn row_to_user(row: &Row<'_>) -> duckdb::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        session_id: row.get(3)?,
        reset_token: row.get(4)?,
    })
}
