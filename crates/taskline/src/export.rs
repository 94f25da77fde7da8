//! CSV export.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;
use taskline_core::Task;
use taskline_store::TaskRepository;
use tracing::info;

/// Column headers, in row order.
pub const HEADERS: [&str; 5] = ["ID", "Title", "Description", "Due Date", "Status"];

/// Result of an export request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// There were no tasks; no file was written.
    Empty,
    /// The file was written with this many task rows.
    Written(usize),
}

impl ExportOutcome {
    /// User-facing summary line.
    pub fn message(self, path: &Path) -> String {
        match self {
            Self::Empty => "No tasks to export.".to_string(),
            Self::Written(rows) => {
                format!("Exported {rows} task(s) to {}", path.display())
            }
        }
    }
}

/// Export every task to `path`, overwriting it.
pub fn export_tasks(repo: &TaskRepository, path: &Path) -> Result<ExportOutcome> {
    let tasks = repo.fetch_all().context("failed to load tasks for export")?;
    if tasks.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_tasks(&mut writer, &tasks)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = tasks.len(), "tasks exported");
    Ok(ExportOutcome::Written(tasks.len()))
}

/// Write the header and one record per task.
pub fn write_tasks<W: io::Write>(writer: &mut Writer<W>, tasks: &[Task]) -> csv::Result<()> {
    writer.write_record(HEADERS)?;
    for task in tasks {
        writer.write_record([
            task.id.to_string().as_str(),
            task.title.as_str(),
            task.description.as_deref().unwrap_or_default(),
            task.due_date.as_deref().unwrap_or_default(),
            task.status_label(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
