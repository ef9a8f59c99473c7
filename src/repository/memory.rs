use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LabelRepository, StatusRepository, TaskRepository, UserRepository};
use crate::error::{AppError, AppResult, FOREIGN_KEY_MESSAGE};
use crate::models::{Label, Status, Task, TaskFilter, User};

/// Task row as the database would hold it: references by id only.
#[derive(Debug, Clone)]
struct TaskRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    status_id: Uuid,
    author_id: Uuid,
    executor_id: Option<Uuid>,
    label_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            status_id: task.status.id,
            author_id: task.author.id,
            executor_id: task.executor.as_ref().map(|e| e.id),
            label_ids: task.labels.iter().map(|l| l.id).collect(),
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    statuses: HashMap<Uuid, Status>,
    labels: HashMap<Uuid, Label>,
    tasks: HashMap<Uuid, TaskRecord>,
}

impl Tables {
    fn hydrate(&self, record: &TaskRecord) -> AppResult<Task> {
        let missing = || AppError::InternalServerError(format!("task {} is dangling", record.id));
        let labels = record
            .label_ids
            .iter()
            .map(|id| self.labels.get(id).cloned().ok_or_else(missing))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Task {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            status: self.statuses.get(&record.status_id).cloned().ok_or_else(missing)?,
            author: self.users.get(&record.author_id).cloned().ok_or_else(missing)?,
            executor: match record.executor_id {
                Some(id) => Some(self.users.get(&id).cloned().ok_or_else(missing)?),
                None => None,
            },
            labels,
            created_at: record.created_at,
        })
    }

    /// A reference that vanished after the caller resolved it is reported the same
    /// way as one that never existed.
    fn check_references(&self, record: &TaskRecord) -> AppResult<()> {
        if !self.statuses.contains_key(&record.status_id) {
            return Err(AppError::InvalidReference {
                kind: "Status",
                id: record.status_id,
            });
        }
        if let Some(&id) = record.label_ids.iter().find(|id| !self.labels.contains_key(id)) {
            return Err(AppError::InvalidReference { kind: "Label", id });
        }
        let users = std::iter::once(record.author_id).chain(record.executor_id);
        for id in users {
            if !self.users.contains_key(&id) {
                return Err(AppError::InvalidReference { kind: "User", id });
            }
        }
        Ok(())
    }

    fn task_refs(&self, predicate: impl Fn(&TaskRecord) -> bool) -> bool {
        self.tasks.values().any(predicate)
    }
}

/// In-process store implementing every repository trait with the same
/// uniqueness and foreign-key rules as the Postgres schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict_on_duplicate<'a, T: 'a>(
    mut existing: impl Iterator<Item = &'a T>,
    id: Uuid,
    id_of: impl Fn(&T) -> Uuid,
    same_key: impl Fn(&T) -> bool,
) -> AppResult<()> {
    if existing.any(|row| id_of(row) != id && same_key(row)) {
        return Err(AppError::Conflict("Record already exists".into()));
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        conflict_on_duplicate(tables.users.values(), user.id, |u| u.id, |u| {
            u.email == user.email
        })?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.task_refs(|t| t.author_id == id || t.executor_id == Some(id)) {
            return Err(AppError::Conflict(FOREIGN_KEY_MESSAGE.into()));
        }
        tables.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StatusRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Status>> {
        Ok(self.tables.read().await.statuses.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Status>> {
        let mut statuses: Vec<Status> =
            self.tables.read().await.statuses.values().cloned().collect();
        statuses.sort_by_key(|s| s.created_at);
        Ok(statuses)
    }

    async fn save(&self, status: Status) -> AppResult<Status> {
        let mut tables = self.tables.write().await;
        conflict_on_duplicate(tables.statuses.values(), status.id, |s| s.id, |s| {
            s.name == status.name
        })?;
        tables.statuses.insert(status.id, status.clone());
        Ok(status)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.task_refs(|t| t.status_id == id) {
            return Err(AppError::Conflict(FOREIGN_KEY_MESSAGE.into()));
        }
        tables.statuses.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LabelRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Label>> {
        Ok(self.tables.read().await.labels.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Label>> {
        let mut labels: Vec<Label> = self.tables.read().await.labels.values().cloned().collect();
        labels.sort_by_key(|l| l.created_at);
        Ok(labels)
    }

    async fn save(&self, label: Label) -> AppResult<Label> {
        let mut tables = self.tables.write().await;
        conflict_on_duplicate(tables.labels.values(), label.id, |l| l.id, |l| {
            l.name == label.name
        })?;
        tables.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.task_refs(|t| t.label_ids.contains(&id)) {
            return Err(AppError::Conflict(FOREIGN_KEY_MESSAGE.into()));
        }
        tables.labels.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let tables = self.tables.read().await;
        tables.tasks.get(&id).map(|record| tables.hydrate(record)).transpose()
    }

    async fn find_all(&self, filter: Option<&TaskFilter>) -> AppResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks = tables
            .tasks
            .values()
            .map(|record| tables.hydrate(record))
            .collect::<AppResult<Vec<_>>>()?;
        if let Some(filter) = filter {
            tasks.retain(|task| task.matches(filter));
        }
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn save(&self, task: Task) -> AppResult<Task> {
        let mut tables = self.tables.write().await;
        let record = TaskRecord::from(&task);
        tables.check_references(&record)?;
        tables.tasks.insert(record.id, record);
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.tables.write().await.tasks.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelInput, StatusInput, UserInput};

    fn user(email: &str) -> User {
        User::new(
            &UserInput {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password: "password".to_string(),
            },
            "hash".to_string(),
        )
    }

    async fn seeded() -> (MemoryStore, Task) {
        let store = MemoryStore::new();
        let author = UserRepository::save(&store, user("author@example.com")).await.unwrap();
        let status = StatusRepository::save(&store, Status::new(StatusInput { name: "new".into() }))
            .await
            .unwrap();
        let label = LabelRepository::save(&store, Label::new(LabelInput { name: "bug".into() }))
            .await
            .unwrap();
        let task = Task::new("Task".into(), None, status, author, None, vec![label]);
        let task = TaskRepository::save(&store, task).await.unwrap();
        (store, task)
    }

    #[actix_rt::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let (store, task) = seeded().await;

        let err = StatusRepository::delete(&store, task.status.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = LabelRepository::delete(&store, task.labels[0].id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = UserRepository::delete(&store, task.author.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        TaskRepository::delete(&store, task.id).await.unwrap();
        StatusRepository::delete(&store, task.status.id).await.unwrap();
        assert!(StatusRepository::find_by_id(&store, task.status.id)
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_duplicate_names_conflict() {
        let store = MemoryStore::new();
        StatusRepository::save(&store, Status::new(StatusInput { name: "new".into() }))
            .await
            .unwrap();
        let err = StatusRepository::save(&store, Status::new(StatusInput { name: "new".into() }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        UserRepository::save(&store, user("a@example.com")).await.unwrap();
        let err = UserRepository::save(&store, user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_tasks_see_updated_references() {
        let (store, task) = seeded().await;
        let mut renamed = task.status.clone();
        renamed.name = "in progress".into();
        StatusRepository::save(&store, renamed).await.unwrap();

        let reloaded = TaskRepository::find_by_id(&store, task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status.name, "in progress");
    }

    #[actix_rt::test]
    async fn test_task_with_missing_reference_is_rejected() {
        let (store, task) = seeded().await;
        let mut orphan = task.clone();
        orphan.id = Uuid::new_v4();
        orphan.status = Status::new(StatusInput { name: "ghost".into() });
        let ghost = orphan.status.id;
        let err = TaskRepository::save(&store, orphan).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference { kind: "Status", id } if id == ghost));
        assert_eq!(TaskRepository::find_all(&store, None).await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_label_deleted_before_save_is_an_invalid_reference() {
        let (store, task) = seeded().await;
        let doomed = LabelRepository::save(&store, Label::new(LabelInput { name: "doomed".into() }))
            .await
            .unwrap();
        let mut edited = task.clone();
        edited.labels.push(doomed.clone());
        LabelRepository::delete(&store, doomed.id).await.unwrap();

        let err = TaskRepository::save(&store, edited).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference { kind: "Label", id } if id == doomed.id));
        let stored = TaskRepository::find_by_id(&store, task.id).await.unwrap().unwrap();
        assert_eq!(stored.labels, task.labels);
    }
}
