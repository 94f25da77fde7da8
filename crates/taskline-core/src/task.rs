//! The task record and the parameter types used to create, change, and
//! query it.

use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned task identifier.
pub type TaskId = i64;

/// A persisted task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id, assigned on creation and never reused.
    pub id: TaskId,
    /// Non-empty title, at most 100 characters.
    pub title: String,
    /// Optional free text, at most 500 characters.
    pub description: Option<String>,
    /// Due date as `YYYY-MM-DD`. Rows written outside this crate may lack one.
    pub due_date: Option<String>,
    /// Completion flag; `false` on creation.
    pub is_completed: bool,
}

impl Task {
    /// Human label for the completion flag.
    pub fn status_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else {
            "Incomplete"
        }
    }
}

/// Fields supplied when creating a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Due date as `YYYY-MM-DD`.
    pub due_date: String,
}

impl NewTask {
    /// Convenience constructor.
    pub fn new(
        title: impl Into<String>,
        description: Option<&str>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_owned),
            due_date: due_date.into(),
        }
    }
}

/// A partial update. Omitted fields keep their stored value.
///
/// `description` distinguishes "not supplied" (`None`) from "clear it"
/// (`Some(None)`), so a JSON body of `{"description": null}` removes the
/// description while `{}` leaves it alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// New completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// A patch that only flips the completion flag.
    pub fn completion(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    /// Whether the patch supplies no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.is_completed.is_none()
    }

    /// Merge onto `current`: supplied fields win, omitted fields are kept.
    pub fn apply_to(&self, current: &Task) -> Task {
        Task {
            id: current.id,
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            due_date: self.due_date.clone().or_else(|| current.due_date.clone()),
            is_completed: self.is_completed.unwrap_or(current.is_completed),
        }
    }
}

/// Optional, conjunctive filters for listing tasks.
///
/// `None` on every field means "all tasks".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Only tasks with this completion flag.
    #[serde(default)]
    pub is_completed: Option<bool>,
    /// Only tasks due on or after this date.
    #[serde(default)]
    pub from_date: Option<String>,
    /// Only tasks due on or before this date.
    #[serde(default)]
    pub to_date: Option<String>,
}

impl TaskFilter {
    /// Filter on completion only.
    pub fn by_status(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Self::default()
        }
    }

    /// Filter on an inclusive due-date range; either bound may be open.
    pub fn due_between(from_date: Option<&str>, to_date: Option<&str>) -> Self {
        Self {
            is_completed: None,
            from_date: from_date.map(str::to_owned),
            to_date: to_date.map(str::to_owned),
        }
    }
}

/// Deserialize a field that is present (possibly `null`) as `Some(..)`.
/// Paired with `#[serde(default)]`, an absent field stays `None`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
