use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Label, Status, User, UserDto};

/// Input structure for creating or updating a task.
/// Contains validation rules for its fields; reference ids are resolved by the task service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The name of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// An optional description for the task.
    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Required status reference.
    pub status_id: Uuid,

    /// Optional assignee. An id that does not resolve is stored as no executor.
    pub executor_id: Option<Uuid>,

    /// Optional labels. Every id must resolve or the write is rejected.
    pub label_ids: Option<Vec<Uuid>>,
}

/// A task with its references resolved, as held by the repositories.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    /// Set once from the caller at creation time.
    pub author: User,
    pub executor: Option<User>,
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` with a fresh id and `created_at` set to now.
    pub fn new(
        name: String,
        description: Option<String>,
        status: Status,
        author: User,
        executor: Option<User>,
        labels: Vec<Label>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            status,
            author,
            executor,
            labels,
            created_at: Utc::now(),
        }
    }

    /// Whether this task matches every constraint set on `filter`.
    pub fn matches(&self, filter: &TaskFilter) -> bool {
        filter.status_id.map_or(true, |id| self.status.id == id)
            && filter
                .executor_id
                .map_or(true, |id| self.executor.as_ref().map(|e| e.id) == Some(id))
            && filter
                .label_id
                .map_or(true, |id| self.labels.iter().any(|label| label.id == id))
            && filter.author_id.map_or(true, |id| self.author.id == id)
    }
}

/// External representation of a task with its references denormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub author: UserDto,
    pub executor: Option<UserDto>,
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            author: UserDto::from(&task.author),
            executor: task.executor.as_ref().map(UserDto::from),
            labels: task.labels.clone(),
            created_at: task.created_at,
        }
    }
}

/// Narrows a task listing. Every constraint that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status_id: Option<Uuid>,
    pub executor_id: Option<Uuid>,
    pub label_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self == &TaskFilter::default()
    }
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status_id: Option<Uuid>,
    /// Filter tasks by executor's user ID.
    pub executor_id: Option<Uuid>,
    /// Filter tasks carrying this label.
    pub label_id: Option<Uuid>,
    /// Only tasks authored by the caller.
    pub my_tasks: Option<bool>,
}

impl TaskQuery {
    /// Resolves the query against the caller. `None` when no constraint was given.
    pub fn into_filter(self, caller_id: Uuid) -> Option<TaskFilter> {
        let filter = TaskFilter {
            status_id: self.status_id,
            executor_id: self.executor_id,
            label_id: self.label_id,
            author_id: self.my_tasks.unwrap_or(false).then_some(caller_id),
        };
        (!filter.is_empty()).then_some(filter)
    }
}
