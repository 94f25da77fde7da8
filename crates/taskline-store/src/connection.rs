//! The storage engine: a pooled `SQLite` handle with scoped statements.
//!
//! Every statement goes through [`Database::run`], which checks a connection
//! out of the `r2d2` pool, opens a transaction, runs the statement with bound
//! parameters, and commits. The transaction and the pooled connection are
//! RAII guards, so an error at any step rolls back and hands the connection
//! back to the pool. Failures are logged with the statement text (never the
//! bound values) before being returned.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction};
use tracing::{debug, error, info};

use crate::errors::{StorageError, StorageErrorKind};
use crate::schema;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 8).
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
    /// How long to wait for a free pooled connection (default: 5000).
    pub connection_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5_000,
            connection_timeout_ms: 5_000,
        }
    }
}

/// Pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_millis(u64::from(self.busy_timeout_ms)))?;
        conn.execute_batch(schema::PRAGMAS)
    }
}

/// Outcome of a statement run without fetching rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Executed {
    /// Rows inserted, updated, or deleted.
    pub rows_affected: usize,
    /// Rowid of the most recent insert on the statement's connection.
    pub last_insert_id: i64,
}

/// Shared handle to the task database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
    path: PathBuf,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("pool_size", &self.pool.max_size())
            .finish()
    }
}

impl Database {
    /// Open (or create) a file-backed database.
    ///
    /// Creates the parent directory if needed. Does not touch the schema;
    /// call [`Database::ensure_schema`] afterwards.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                logged(
                    "open",
                    StorageError::new(
                        StorageErrorKind::ConnectionFailure,
                        format!("create dir {}: {e}", parent.display()),
                    ),
                )
            })?;
        }

        let pool = build_pool(SqliteConnectionManager::file(path), config)
            .map_err(|e| logged("open", e))?;
        info!(path = %path.display(), pool_size = config.pool_size, "database opened");

        Ok(Self {
            pool,
            path: path.to_owned(),
        })
    }

    /// Open an in-memory database.
    ///
    /// The pool holds exactly one connection so every statement sees the
    /// same in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        let config = ConnectionConfig {
            pool_size: 1,
            ..ConnectionConfig::default()
        };
        let pool = build_pool(SqliteConnectionManager::memory(), &config)
            .map_err(|e| logged("open", e))?;
        Ok(Self {
            pool,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Create the task table and indexes if they are missing.
    ///
    /// Idempotent, safe to call on every process start.
    pub fn ensure_schema(&self) -> Result<(), StorageError> {
        self.run("ensure_schema", |tx| tx.execute_batch(schema::TASKS_SCHEMA))?;
        debug!(path = %self.path.display(), "schema ensured");
        Ok(())
    }

    /// Run a statement that returns no rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<Executed, StorageError> {
        self.run(sql, |tx| {
            let rows_affected = tx.execute(sql, params)?;
            Ok(Executed {
                rows_affected,
                last_insert_id: tx.last_insert_rowid(),
            })
        })
    }

    /// Run a query and map its first row, if any.
    pub fn fetch_one<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>, StorageError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.run(sql, |tx| tx.query_row(sql, params, map).optional())
    }

    /// Run a query and map every row.
    pub fn fetch_all<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>, StorageError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.run(sql, |tx| {
            let mut stmt = tx.prepare(sql)?;
            let rows = stmt.query_map(params, map)?;
            rows.collect()
        })
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> Result<(), StorageError> {
        let _ = self.fetch_one("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Path the database was opened from (`:memory:` for in-memory).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scoped acquisition: connection, transaction, statement, commit.
    fn run<T, F>(&self, statement: &str, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        self.scoped(op).map_err(|e| logged(statement, e))
    }

    fn scoped<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

fn build_pool(
    manager: SqliteConnectionManager,
    config: &ConnectionConfig,
) -> Result<ConnectionPool, StorageError> {
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
        }))
        .build(manager)?;
    Ok(pool)
}

/// Report a storage failure, then hand it back for propagation.
fn logged(statement: &str, err: StorageError) -> StorageError {
    error!(
        statement = %one_line(statement),
        kind = %err.kind,
        error = %err.message,
        "storage statement failed"
    );
    err
}

fn one_line(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn memory_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.ensure_schema().unwrap();
        db
    }

    fn count(db: &Database) -> i64 {
        db.fetch_one("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn open_in_memory() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.path(), Path::new(":memory:"));
        db.ping().unwrap();
    }

    #[test]
    fn ensure_schema_is_idempotent_and_keeps_rows() {
        let db = memory_db();
        let _ = db
            .execute(
                "INSERT INTO tasks (title, due_date) VALUES (?1, ?2)",
                ("Buy milk", "2025-01-15"),
            )
            .unwrap();

        db.ensure_schema().unwrap();
        db.ensure_schema().unwrap();

        assert_eq!(count(&db), 1);
    }

    #[test]
    fn execute_reports_insert_id_and_rows() {
        let db = memory_db();
        let first = db
            .execute(
                "INSERT INTO tasks (title, due_date) VALUES (?1, ?2)",
                ("a", "2025-01-01"),
            )
            .unwrap();
        let second = db
            .execute(
                "INSERT INTO tasks (title, due_date) VALUES (?1, ?2)",
                ("b", "2025-01-02"),
            )
            .unwrap();
        assert_eq!(first.rows_affected, 1);
        assert_eq!(second.last_insert_id, first.last_insert_id + 1);

        let done = db.execute("UPDATE tasks SET is_completed = 1", []).unwrap();
        assert_eq!(done.rows_affected, 2);
    }

    #[test]
    fn fetch_one_without_rows_is_none() {
        let db = memory_db();
        let row: Option<String> = db
            .fetch_one("SELECT title FROM tasks WHERE id = ?1", [99], |row| row.get(0))
            .unwrap();
        assert_eq!(row, None);
    }

    #[test]
    fn fetch_all_maps_rows_in_order() {
        let db = memory_db();
        for title in ["one", "two", "three"] {
            let _ = db
                .execute(
                    "INSERT INTO tasks (title, due_date) VALUES (?1, '2025-01-01')",
                    [title],
                )
                .unwrap();
        }
        let titles: Vec<String> = db
            .fetch_all("SELECT title FROM tasks ORDER BY id", [], |row| row.get(0))
            .unwrap();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[test]
    fn not_null_violation_is_classified_and_rolled_back() {
        let db = memory_db();
        let err = db
            .execute(
                "INSERT INTO tasks (title, due_date) VALUES (NULL, '2025-01-01')",
                [],
            )
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::ConstraintViolation);
        assert!(err.message.contains("NOT NULL"), "got: {}", err.message);
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn check_violation_is_classified() {
        let db = memory_db();
        let err = db
            .execute(
                "INSERT INTO tasks (title, due_date, is_completed) VALUES ('x', '2025-01-01', 7)",
                [],
            )
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::ConstraintViolation);
    }

    #[test]
    fn bad_sql_is_unknown() {
        let db = memory_db();
        let err = db.execute("INSERT INTO nowhere VALUES (1)", []).unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::Unknown);
    }

    #[test]
    fn connection_released_after_failure() {
        // Single-connection pool: a leaked connection would make the next
        // checkout time out.
        let db = memory_db();
        for _ in 0..3 {
            assert_matches!(
                db.execute("INSERT INTO tasks (title) VALUES (NULL)", []),
                Err(StorageError {
                    kind: StorageErrorKind::ConstraintViolation,
                    ..
                })
            );
        }
        db.ping().unwrap();
    }

    #[test]
    fn open_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.db");
        let db = Database::open(&path, &ConnectionConfig::default()).unwrap();
        db.ensure_schema().unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());

        // Reopen: schema and rows survive
        let _ = db
            .execute(
                "INSERT INTO tasks (title, due_date) VALUES ('x', '2025-01-01')",
                [],
            )
            .unwrap();
        drop(db);
        let reopened = Database::open(&path, &ConnectionConfig::default()).unwrap();
        reopened.ensure_schema().unwrap();
        assert_eq!(count(&reopened), 1);
    }

    #[test]
    fn file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("wal.db"), &ConnectionConfig::default()).unwrap();
        let mode: String = db
            .fetch_one("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn statements_from_many_threads() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("threads.db"), &ConnectionConfig::default()).unwrap();
        db.ensure_schema().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let _ = db
                            .execute(
                                "INSERT INTO tasks (title, due_date) VALUES (?1, '2025-01-01')",
                                [format!("t{i}-{j}")],
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count(&db), 80);
    }

    #[test]
    fn one_line_collapses_whitespace() {
        assert_eq!(
            one_line("SELECT id\n    FROM tasks\n  WHERE id = ?1"),
            "SELECT id FROM tasks WHERE id = ?1"
        );
    }
}
