//! Persistence collaborators.
//!
//! Services only see these traits. `PgStore` backs them with Postgres through `sqlx`,
//! `MemoryStore` keeps everything in process and is used for development runs and tests.
//! Every `save` is an upsert keyed on the entity id.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Label, Status, Task, TaskFilter, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_all(&self) -> AppResult<Vec<User>>;
    async fn save(&self, user: User) -> AppResult<User>;
    /// Fails with `Conflict` while a task still references the user.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Status>>;
    async fn find_all(&self) -> AppResult<Vec<Status>>;
    async fn save(&self, status: Status) -> AppResult<Status>;
    /// Fails with `Conflict` while a task still references the status.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Label>>;
    async fn find_all(&self) -> AppResult<Vec<Label>>;
    async fn save(&self, label: Label) -> AppResult<Label>;
    /// Fails with `Conflict` while a task still carries the label.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>>;
    /// Tasks ordered by creation time, newest first. `None` returns every task.
    async fn find_all(&self, filter: Option<&TaskFilter>) -> AppResult<Vec<Task>>;
    async fn save(&self, task: Task) -> AppResult<Task>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}
