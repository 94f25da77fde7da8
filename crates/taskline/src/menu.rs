//! Interactive numbered menu over the task repository.
//!
//! Generic over its input and output so sessions can be scripted. Every
//! prompt re-asks until it gets a usable answer; end of input quits.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use taskline_core::{
    NewTask, Task, TaskFilter, TaskId, TaskPatch, validate_description, validate_due_date,
    validate_title,
};
use taskline_store::{TaskError, TaskRepository};

use crate::export;

const MENU: &str = "\nMenu
1. Add a task
2. Show all tasks
3. Update task status
4. Delete a task
5. Filter tasks by status
6. Filter tasks by due date
7. Export tasks to CSV
8. Exit";

const DEFAULT_EXPORT_FILE: &str = "tasks.csv";

/// Whether the loop keeps going after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Menu session state.
pub struct Menu<R, W> {
    repo: TaskRepository,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Session over `repo`, reading answers from `input`.
    pub fn new(repo: TaskRepository, input: R, output: W) -> Self {
        Self { repo, input, output }
    }

    /// Consume the session and hand back the output sink.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };
            let flow = match choice.as_str() {
                "1" => self.add_task()?,
                "2" => self.show_all()?,
                "3" => self.update_status()?,
                "4" => self.delete_task()?,
                "5" => self.filter_by_status()?,
                "6" => self.filter_by_date()?,
                "7" => self.export()?,
                "8" => Flow::Quit,
                _ => {
                    writeln!(self.output, "Invalid choice, try again.")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }
        writeln!(self.output, "Taskline is closing. Your data is safe. Goodbye!")?;
        Ok(())
    }

    fn add_task(&mut self) -> Result<Flow> {
        writeln!(self.output, "\nEnter the details for the new task")?;

        let title = loop {
            let Some(raw) = self.prompt("Title (required): ")? else {
                return Ok(Flow::Quit);
            };
            match validate_title(&raw) {
                Ok(title) => break title.to_owned(),
                Err(e) => writeln!(self.output, "Invalid title: {e}")?,
            }
        };

        let description = loop {
            let Some(raw) = self.prompt("Description (optional): ")? else {
                return Ok(Flow::Quit);
            };
            let description = (!raw.is_empty()).then_some(raw);
            match validate_description(description.as_deref()) {
                Ok(_) => break description,
                Err(e) => writeln!(self.output, "Invalid description: {e}")?,
            }
        };

        let Some(due_date) = self.prompt_date("Due Date (YYYY-MM-DD): ", false)? else {
            return Ok(Flow::Quit);
        };
        let Some(due_date) = due_date else {
            return Ok(Flow::Continue);
        };

        let new = NewTask {
            title,
            description,
            due_date,
        };
        match self.repo.create(&new) {
            Ok(id) => writeln!(self.output, "\nTask '{}' added successfully with ID {id}!", new.title)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn show_all(&mut self) -> Result<Flow> {
        match self.repo.fetch_all() {
            Ok(tasks) => self.print_tasks(&tasks, "No tasks found.")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn update_status(&mut self) -> Result<Flow> {
        let Some(id) = self.prompt_id("Enter the ID of the task you want to update: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(is_completed) =
            self.prompt_status("Enter the new status (0 for incomplete, 1 for complete): ")?
        else {
            return Ok(Flow::Quit);
        };
        match self.repo.update(id, &TaskPatch::completion(is_completed)) {
            Ok(_) => writeln!(self.output, "Task with ID {id} updated successfully!")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn delete_task(&mut self) -> Result<Flow> {
        let Some(id) = self.prompt_id("Enter the ID of the task to delete: ")? else {
            return Ok(Flow::Quit);
        };
        match self.repo.delete(id) {
            Ok(()) => writeln!(self.output, "Task with ID {id} has been deleted.")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn filter_by_status(&mut self) -> Result<Flow> {
        writeln!(self.output, "\nFilter tasks by status:")?;
        writeln!(self.output, "0. Show incomplete tasks")?;
        writeln!(self.output, "1. Show completed tasks")?;
        let Some(is_completed) = self.prompt_status("Choose a status (0 or 1): ")? else {
            return Ok(Flow::Quit);
        };
        match self.repo.fetch(&TaskFilter::by_status(is_completed)) {
            Ok(tasks) => self.print_tasks(&tasks, "\nNo tasks found for the selected status.")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn filter_by_date(&mut self) -> Result<Flow> {
        let Some(from) = self.prompt_date("From date (YYYY-MM-DD, blank for none): ", true)? else {
            return Ok(Flow::Quit);
        };
        let Some(to) = self.prompt_date("To date (YYYY-MM-DD, blank for none): ", true)? else {
            return Ok(Flow::Quit);
        };
        let filter = TaskFilter::due_between(from.as_deref(), to.as_deref());
        match self.repo.fetch(&filter) {
            Ok(tasks) => self.print_tasks(&tasks, "\nNo tasks found in that date range.")?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn export(&mut self) -> Result<Flow> {
        let prompt = format!("File name (default {DEFAULT_EXPORT_FILE}): ");
        let Some(raw) = self.prompt(&prompt)? else {
            return Ok(Flow::Quit);
        };
        let path = if raw.is_empty() {
            PathBuf::from(DEFAULT_EXPORT_FILE)
        } else {
            PathBuf::from(raw)
        };
        match export::export_tasks(&self.repo, &path) {
            Ok(outcome) => writeln!(self.output, "{}", outcome.message(&path))?,
            Err(e) => writeln!(self.output, "Error: {e:#}")?,
        }
        Ok(Flow::Continue)
    }

    // ── prompts ─────────────────────────────────────────────────────────

    /// One trimmed line, or `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_id(&mut self, text: &str) -> Result<Option<TaskId>> {
        loop {
            let Some(raw) = self.prompt(text)? else {
                return Ok(None);
            };
            match raw.parse::<TaskId>() {
                Ok(id) => return Ok(Some(id)),
                Err(_) => writeln!(self.output, "Invalid input. Please enter a valid task ID (integer).")?,
            }
        }
    }

    fn prompt_status(&mut self, text: &str) -> Result<Option<bool>> {
        loop {
            let Some(raw) = self.prompt(text)? else {
                return Ok(None);
            };
            match raw.as_str() {
                "0" => return Ok(Some(false)),
                "1" => return Ok(Some(true)),
                _ => writeln!(self.output, "Invalid input. Please enter 0 or 1.")?,
            }
        }
    }

    /// Outer `None` is end of input; inner `None` is a blank answer when
    /// `optional` allows it.
    fn prompt_date(&mut self, text: &str, optional: bool) -> Result<Option<Option<String>>> {
        loop {
            let Some(raw) = self.prompt(text)? else {
                return Ok(None);
            };
            if raw.is_empty() && optional {
                return Ok(Some(None));
            }
            match validate_due_date(&raw) {
                Ok(_) => return Ok(Some(Some(raw))),
                Err(_) => writeln!(self.output, "Invalid date format. Please use YYYY-MM-DD")?,
            }
        }
    }

    // ── output ──────────────────────────────────────────────────────────

    fn print_tasks(&mut self, tasks: &[Task], empty: &str) -> Result<()> {
        if tasks.is_empty() {
            writeln!(self.output, "{empty}")?;
            return Ok(());
        }
        writeln!(self.output)?;
        write!(self.output, "{}", render_table(tasks))?;
        Ok(())
    }

    fn report(&mut self, err: &TaskError) -> Result<()> {
        match err {
            TaskError::NotFound { id } => writeln!(self.output, "No task found with ID {id}.")?,
            other => writeln!(self.output, "Error: {other}")?,
        }
        Ok(())
    }
}

/// Render tasks as a fixed-width table.
pub fn render_table(tasks: &[Task]) -> String {
    let mut out = row("ID", "Title", "Description", "Due Date", "Status");
    out.push_str(&"-".repeat(72));
    out.push('\n');
    for task in tasks {
        out.push_str(&row(
            &task.id.to_string(),
            &task.title,
            task.description.as_deref().unwrap_or_default(),
            task.due_date.as_deref().unwrap_or_default(),
            task.status_label(),
        ));
    }
    out
}

fn row(id: &str, title: &str, description: &str, due: &str, status: &str) -> String {
    format!("{id:<5} | {title:<20} | {description:<20} | {due:<10} | {status}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskline_store::Database;

    fn repo() -> TaskRepository {
        let db = Database::in_memory().unwrap();
        db.ensure_schema().unwrap();
        TaskRepository::new(db)
    }

    fn session(repo: &TaskRepository, script: &str) -> String {
        let mut menu = Menu::new(repo.clone(), script.as_bytes(), Vec::new());
        menu.run().unwrap();
        String::from_utf8(menu.into_output()).unwrap()
    }

    #[test]
    fn exit_immediately() {
        let out = session(&repo(), "8\n");
        assert!(out.contains("1. Add a task"));
        assert!(out.contains("8. Exit"));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn end_of_input_quits() {
        let out = session(&repo(), "");
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn add_reasks_until_valid() {
        let repo = repo();
        let out = session(&repo, "1\n   \nBuy milk\n2%\n2025-13-01\n2025-01-15\n8\n");
        assert!(out.contains("Invalid title"));
        assert!(out.contains("Invalid date format. Please use YYYY-MM-DD"));
        assert!(out.contains("Task 'Buy milk' added successfully"));

        let tasks = repo.fetch_all().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description.as_deref(), Some("2%"));
        assert_eq!(tasks[0].due_date.as_deref(), Some("2025-01-15"));
    }

    #[test]
    fn blank_description_is_stored_as_none() {
        let repo = repo();
        let _ = session(&repo, "1\nCall mom\n\n2025-02-01\n8\n");
        assert_eq!(repo.fetch_all().unwrap()[0].description, None);
    }

    #[test]
    fn show_all_prints_table() {
        let repo = repo();
        let _ = repo.create(&NewTask::new("Buy milk", Some("2%"), "2025-01-15")).unwrap();
        let out = session(&repo, "2\n8\n");
        assert!(out.contains("ID    | Title                | Description          | Due Date   | Status"));
        assert!(out.contains("1     | Buy milk             | 2%                   | 2025-01-15 | Incomplete"));
    }

    #[test]
    fn show_all_renders_undated_row() {
        let repo = repo();
        let _ = repo
            .database()
            .execute("INSERT INTO tasks (title) VALUES ('legacy')", [])
            .unwrap();
        let out = session(&repo, "2\n8\n");
        assert!(out.contains("1     | legacy               |                      |            | Incomplete"));
    }

    #[test]
    fn show_all_empty() {
        let out = session(&repo(), "2\n8\n");
        assert!(out.contains("No tasks found."));
    }

    #[test]
    fn update_status_with_retries() {
        let repo = repo();
        let id = repo.create(&NewTask::new("t", None, "2025-01-15")).unwrap();
        let out = session(&repo, &format!("3\nabc\n{id}\n2\n1\n8\n"));
        assert!(out.contains("Please enter a valid task ID"));
        assert!(out.contains("Please enter 0 or 1."));
        assert!(out.contains(&format!("Task with ID {id} updated successfully!")));
        assert!(repo.fetch_by_id(id).unwrap().is_completed);
    }

    #[test]
    fn update_missing_reports_not_found() {
        let out = session(&repo(), "3\n42\n1\n8\n");
        assert!(out.contains("No task found with ID 42."));
    }

    #[test]
    fn delete_task() {
        let repo = repo();
        let id = repo.create(&NewTask::new("t", None, "2025-01-15")).unwrap();
        let out = session(&repo, &format!("4\n{id}\n4\n{id}\n8\n"));
        assert!(out.contains(&format!("Task with ID {id} has been deleted.")));
        assert!(out.contains(&format!("No task found with ID {id}.")));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn filter_by_status() {
        let repo = repo();
        let _ = repo.create(&NewTask::new("open task", None, "2025-01-15")).unwrap();
        let done = repo.create(&NewTask::new("done task", None, "2025-01-16")).unwrap();
        let _ = repo.update(done, &TaskPatch::completion(true)).unwrap();

        let out = session(&repo, "5\n1\n8\n");
        assert!(out.contains("done task"));
        assert!(!out.contains("open task"));
    }

    #[test]
    fn filter_by_status_none_found() {
        let out = session(&repo(), "5\n1\n8\n");
        assert!(out.contains("No tasks found for the selected status."));
    }

    #[test]
    fn filter_by_date_range() {
        let repo = repo();
        let _ = repo.create(&NewTask::new("early", None, "2025-01-01")).unwrap();
        let _ = repo.create(&NewTask::new("mid", None, "2025-01-15")).unwrap();
        let _ = repo.create(&NewTask::new("late", None, "2025-02-01")).unwrap();

        let out = session(&repo, "6\n2025-01-10\n2025-01-31\n8\n");
        assert!(out.contains("mid"));
        assert!(!out.contains("early"));
        assert!(!out.contains("late"));

        let out = session(&repo, "6\n\n2025-01-01\n8\n");
        assert!(out.contains("early"));
        assert!(!out.contains("| mid"));
    }

    #[test]
    fn export_from_menu() {
        let repo = repo();
        let _ = repo.create(&NewTask::new("t", None, "2025-01-15")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let out = session(&repo, &format!("7\n{}\n8\n", path.display()));
        assert!(out.contains("Exported 1 task(s)"));
        assert!(path.exists());
    }

    #[test]
    fn export_empty_from_menu() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let out = session(&repo(), &format!("7\n{}\n8\n", path.display()));
        assert!(out.contains("No tasks to export."));
        assert!(!path.exists());
    }

    #[test]
    fn unknown_choice() {
        let out = session(&repo(), "9\n8\n");
        assert!(out.contains("Invalid choice, try again."));
    }
}
