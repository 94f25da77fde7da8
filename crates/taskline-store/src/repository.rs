//! Typed task operations over the storage engine.
//!
//! Every operation validates its input before any statement runs, so a
//! [`TaskError::Validation`] never leaves a partial write behind. Updates read
//! the current row first: a missing id fails with [`TaskError::NotFound`]
//! before anything is written, and omitted fields are carried over from the
//! stored row.

use rusqlite::{Row, params};
use taskline_core::{
    NewTask, Task, TaskFilter, TaskId, TaskPatch, validate_description, validate_due_date,
    validate_title,
};
use tracing::{debug, instrument};

use crate::connection::Database;
use crate::errors::{Result, TaskError};
use crate::query::TaskQuery;
use crate::schema::TASK_COLUMNS;

/// Map a `tasks` row by column name.
fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        is_completed: row.get("is_completed")?,
    })
}

/// Task CRUD backed by a [`Database`].
#[derive(Clone, Debug)]
pub struct TaskRepository {
    db: Database,
}

impl TaskRepository {
    /// Wrap a database handle. The schema is expected to exist.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert a new, incomplete task and return its id.
    #[instrument(skip_all)]
    pub fn create(&self, new: &NewTask) -> Result<TaskId> {
        let title = validate_title(&new.title)?;
        let description = validate_description(new.description.as_deref())?;
        let due_date = validate_due_date(&new.due_date)?;

        let executed = self.db.execute(
            "INSERT INTO tasks (title, description, due_date) VALUES (?1, ?2, ?3)",
            params![title, description, due_date],
        )?;

        let id = executed.last_insert_id;
        debug!(task_id = id, "task created");
        Ok(id)
    }

    /// Fetch one task.
    #[instrument(skip(self))]
    pub fn fetch_by_id(&self, id: TaskId) -> Result<Task> {
        self.db
            .fetch_one(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                [id],
                task_from_row,
            )?
            .ok_or_else(|| TaskError::not_found(id))
    }

    /// Fetch the tasks matching every present filter field, in id order.
    #[instrument(skip(self))]
    pub fn fetch(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        if let Some(from) = &filter.from_date {
            let _ = validate_due_date(from)?;
        }
        if let Some(to) = &filter.to_date {
            let _ = validate_due_date(to)?;
        }

        let query = TaskQuery::from_filter(filter);
        let tasks = self
            .db
            .fetch_all(&query.sql(), query.params().as_slice(), task_from_row)?;
        debug!(count = tasks.len(), "tasks fetched");
        Ok(tasks)
    }

    /// Fetch every task.
    pub fn fetch_all(&self) -> Result<Vec<Task>> {
        self.fetch(&TaskFilter::default())
    }

    /// Apply a partial update and return the stored result.
    ///
    /// Supplied fields overwrite the stored ones (last write wins); omitted
    /// fields keep their stored values. An empty patch is a no-op that still
    /// reports `NotFound` for a missing id.
    #[instrument(skip(self, patch))]
    pub fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let current = self.fetch_by_id(id)?;

        let title = patch.title.as_deref().map(validate_title).transpose()?;
        if let Some(description) = &patch.description {
            let _ = validate_description(description.as_deref())?;
        }
        if let Some(due_date) = &patch.due_date {
            let _ = validate_due_date(due_date)?;
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let normalized = TaskPatch {
            title: title.map(str::to_owned),
            ..patch.clone()
        };
        let updated = normalized.apply_to(&current);

        let executed = self.db.execute(
            "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, is_completed = ?4
             WHERE id = ?5",
            params![
                updated.title,
                updated.description,
                updated.due_date,
                updated.is_completed,
                id,
            ],
        )?;

        // Deleted between the read and the write.
        if executed.rows_affected == 0 {
            return Err(TaskError::not_found(id));
        }

        debug!(task_id = id, "task updated");
        Ok(updated)
    }

    /// Remove a task permanently.
    #[instrument(skip(self))]
    pub fn delete(&self, id: TaskId) -> Result<()> {
        let executed = self.db.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if executed.rows_affected == 0 {
            return Err(TaskError::not_found(id));
        }
        debug!(task_id = id, "task deleted");
        Ok(())
    }

    /// Number of stored tasks.
    pub fn count(&self) -> Result<u64> {
        let count: Option<i64> = self
            .db
            .fetch_one("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(count.map_or(0, i64::unsigned_abs))
    }
}
