use std::sync::Arc;

use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Label, Status, Task, TaskDto, TaskFilter, TaskInput, User};
use crate::repository::{LabelRepository, StatusRepository, TaskRepository, UserRepository};

/// References named by a `TaskInput`, resolved against the repositories.
struct ResolvedRefs {
    status: Status,
    executor: Option<User>,
    labels: Vec<Label>,
}

/// CRUD over tasks, translating between `TaskInput`/`TaskDto` and stored `Task`s.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    statuses: Arc<dyn StatusRepository>,
    users: Arc<dyn UserRepository>,
    labels: Arc<dyn LabelRepository>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        statuses: Arc<dyn StatusRepository>,
        users: Arc<dyn UserRepository>,
        labels: Arc<dyn LabelRepository>,
    ) -> Self {
        Self {
            tasks,
            statuses,
            users,
            labels,
        }
    }

    pub async fn get_task_by_id(&self, id: Uuid) -> AppResult<TaskDto> {
        let task = self.load(id).await?;
        Ok(TaskDto::from(&task))
    }

    /// Creates a task authored by `caller`.
    ///
    /// Fails with `InvalidReference` when the status or any label does not exist; an
    /// executor id that does not resolve is stored as no executor. Nothing is persisted
    /// when resolution fails.
    pub async fn create_task(&self, input: TaskInput, caller: &AuthenticatedUser) -> AppResult<TaskDto> {
        let refs = self.resolve(&input).await?;
        let author = self
            .users
            .find_by_id(caller.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Authenticated user no longer exists".into()))?;

        let task = Task::new(
            input.name,
            input.description,
            refs.status,
            author,
            refs.executor,
            refs.labels,
        );
        let saved = self.tasks.save(task).await?;
        log::info!("task {} created by {}", saved.id, caller.id);
        Ok(TaskDto::from(&saved))
    }

    pub async fn get_tasks(&self) -> AppResult<Vec<TaskDto>> {
        self.get_tasks_filtered(None).await
    }

    /// Lists the tasks matching `filter`; `None` lists everything.
    pub async fn get_tasks_filtered(&self, filter: Option<&TaskFilter>) -> AppResult<Vec<TaskDto>> {
        let tasks = self.tasks.find_all(filter).await?;
        Ok(tasks.iter().map(TaskDto::from).collect())
    }

    /// Replaces the mutable fields of a task. The author is left as stored.
    pub async fn update_task(&self, id: Uuid, input: TaskInput) -> AppResult<TaskDto> {
        let mut task = self.load(id).await?;
        let refs = self.resolve(&input).await?;

        task.name = input.name;
        task.description = input.description;
        task.status = refs.status;
        task.executor = refs.executor;
        task.labels = refs.labels;

        let saved = self.tasks.save(task).await?;
        log::info!("task {} updated", saved.id);
        Ok(TaskDto::from(&saved))
    }

    pub async fn delete_task(&self, id: Uuid) -> AppResult<()> {
        let task = self.load(id).await?;
        self.tasks.delete(task.id).await?;
        log::info!("task {} deleted", task.id);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> AppResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    async fn resolve(&self, input: &TaskInput) -> AppResult<ResolvedRefs> {
        let status = self
            .statuses
            .find_by_id(input.status_id)
            .await?
            .ok_or(AppError::InvalidReference {
                kind: "Status",
                id: input.status_id,
            })?;

        // Unlike labels, an unknown executor is dropped instead of rejected.
        let executor = match input.executor_id {
            Some(id) => {
                let executor = self.users.find_by_id(id).await?;
                if executor.is_none() {
                    log::debug!("executor {} not found, task left unassigned", id);
                }
                executor
            }
            None => None,
        };

        let mut labels: Vec<Label> = Vec::new();
        for &id in input.label_ids.iter().flatten() {
            if labels.iter().any(|label| label.id == id) {
                continue;
            }
            let label = self
                .labels
                .find_by_id(id)
                .await?
                .ok_or(AppError::InvalidReference { kind: "Label", id })?;
            labels.push(label);
        }

        Ok(ResolvedRefs {
            status,
            executor,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabelInput, StatusInput, UserInput};
    use crate::repository::MemoryStore;
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: TaskService,
        author: AuthenticatedUser,
        other: AuthenticatedUser,
        status: Status,
        label: Label,
    }

    async fn add_user(store: &MemoryStore, email: &str) -> AuthenticatedUser {
        let user = User::new(
            &UserInput {
                email: email.into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                password: "password".into(),
            },
            "hash".into(),
        );
        let user = UserRepository::save(store, user).await.unwrap();
        AuthenticatedUser {
            id: user.id,
            email: user.email,
        }
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let author = add_user(&store, "author@example.com").await;
        let other = add_user(&store, "other@example.com").await;
        let status = StatusRepository::save(&*store, Status::new(StatusInput { name: "new".into() }))
            .await
            .unwrap();
        let label = LabelRepository::save(&*store, Label::new(LabelInput { name: "bug".into() }))
            .await
            .unwrap();
        let service = TaskService::new(store.clone(), store.clone(), store.clone(), store.clone());
        Fixture {
            store,
            service,
            author,
            other,
            status,
            label,
        }
    }

    fn input(status_id: Uuid) -> TaskInput {
        TaskInput {
            name: "Write docs".into(),
            description: Some("All of them".into()),
            status_id,
            executor_id: None,
            label_ids: None,
        }
    }

    async fn task_count(store: &MemoryStore) -> usize {
        TaskRepository::find_all(store, None).await.unwrap().len()
    }

    #[actix_rt::test]
    async fn test_create_then_get_round_trip() {
        let f = fixture().await;
        let created = f
            .service
            .create_task(
                TaskInput {
                    executor_id: Some(f.other.id),
                    label_ids: Some(vec![f.label.id]),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap();

        let fetched = f.service.get_task_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Write docs");
        assert_eq!(fetched.description.as_deref(), Some("All of them"));
        assert_eq!(fetched.status, f.status);
        assert_eq!(fetched.labels, vec![f.label.clone()]);
        assert_eq!(fetched.author.id, f.author.id);
        assert_eq!(fetched.executor.map(|e| e.id), Some(f.other.id));
    }

    #[actix_rt::test]
    async fn test_unknown_status_is_rejected_and_nothing_persisted() {
        let f = fixture().await;
        let missing = Uuid::new_v4();
        let err = f.service.create_task(input(missing), &f.author).await.unwrap_err();
        match err {
            AppError::InvalidReference { kind, id } => {
                assert_eq!(kind, "Status");
                assert_eq!(id, missing);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(task_count(&f.store).await, 0);
    }

    #[actix_rt::test]
    async fn test_unknown_executor_is_dropped() {
        let f = fixture().await;
        let created = f
            .service
            .create_task(
                TaskInput {
                    executor_id: Some(Uuid::new_v4()),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap();
        assert!(created.executor.is_none());
    }

    #[actix_rt::test]
    async fn test_any_unknown_label_rejects_the_write() {
        let f = fixture().await;
        let missing = Uuid::new_v4();
        let err = f
            .service
            .create_task(
                TaskInput {
                    label_ids: Some(vec![f.label.id, missing]),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference { kind: "Label", id } if id == missing));
        assert_eq!(task_count(&f.store).await, 0);
    }

    #[actix_rt::test]
    async fn test_duplicate_label_ids_are_collapsed() {
        let f = fixture().await;
        let created = f
            .service
            .create_task(
                TaskInput {
                    label_ids: Some(vec![f.label.id, f.label.id]),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap();
        assert_eq!(created.labels.len(), 1);
    }

    #[actix_rt::test]
    async fn test_missing_ids_are_not_found() {
        let f = fixture().await;
        let id = Uuid::new_v4();
        assert!(matches!(f.service.get_task_by_id(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            f.service.update_task(id, input(f.status.id)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(f.service.delete_task(id).await, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_update_replaces_fields_but_keeps_author() {
        let f = fixture().await;
        let created = f
            .service
            .create_task(
                TaskInput {
                    executor_id: Some(f.other.id),
                    label_ids: Some(vec![f.label.id]),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap();

        let updated = f
            .service
            .update_task(
                created.id,
                TaskInput {
                    name: "Renamed".into(),
                    description: None,
                    status_id: f.status.id,
                    executor_id: None,
                    label_ids: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.description, None);
        assert!(updated.executor.is_none());
        assert!(updated.labels.is_empty());
        assert_eq!(updated.author, created.author);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[actix_rt::test]
    async fn test_update_with_unknown_status_leaves_task_untouched() {
        let f = fixture().await;
        let created = f.service.create_task(input(f.status.id), &f.author).await.unwrap();
        let err = f
            .service
            .update_task(
                created.id,
                TaskInput {
                    name: "Changed".into(),
                    ..input(Uuid::new_v4())
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference { kind: "Status", .. }));
        assert_eq!(f.service.get_task_by_id(created.id).await.unwrap().name, "Write docs");
    }

    #[actix_rt::test]
    async fn test_filtered_listing() {
        let f = fixture().await;
        let labelled = f
            .service
            .create_task(
                TaskInput {
                    label_ids: Some(vec![f.label.id]),
                    ..input(f.status.id)
                },
                &f.author,
            )
            .await
            .unwrap();
        let by_other = f.service.create_task(input(f.status.id), &f.other).await.unwrap();

        assert_eq!(f.service.get_tasks().await.unwrap().len(), 2);
        assert_eq!(f.service.get_tasks_filtered(None).await.unwrap().len(), 2);

        let with_label = f
            .service
            .get_tasks_filtered(Some(&TaskFilter {
                label_id: Some(f.label.id),
                ..TaskFilter::default()
            }))
            .await
            .unwrap();
        assert_eq!(with_label.iter().map(|t| t.id).collect::<Vec<_>>(), vec![labelled.id]);

        let mine = f
            .service
            .get_tasks_filtered(Some(&TaskFilter {
                author_id: Some(f.other.id),
                ..TaskFilter::default()
            }))
            .await
            .unwrap();
        assert_eq!(mine.iter().map(|t| t.id).collect::<Vec<_>>(), vec![by_other.id]);
    }

    #[actix_rt::test]
    async fn test_delete_removes_task() {
        let f = fixture().await;
        let created = f.service.create_task(input(f.status.id), &f.author).await.unwrap();
        f.service.delete_task(created.id).await.unwrap();
        assert!(matches!(
            f.service.get_task_by_id(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
