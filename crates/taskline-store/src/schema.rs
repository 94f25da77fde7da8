//! SQL DDL for the task table.
//!
//! `AUTOINCREMENT` keeps SQLite from handing out the id of a deleted
//! highest row again.

/// Idempotent DDL; safe to run on every start.
pub const TASKS_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    is_completed INTEGER NOT NULL DEFAULT 0
        CHECK(is_completed IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_tasks_due_date
    ON tasks(due_date);
";

/// Pragmas applied to every new pooled connection. The busy timeout is
/// set separately from the connection config.
pub const PRAGMAS: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
";

/// Column list shared by every task `SELECT`.
pub const TASK_COLUMNS: &str = "id, title, description, due_date, is_completed";
