use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{LabelRepository, StatusRepository, TaskRepository, UserRepository};
use crate::error::{AppError, AppResult, FOREIGN_KEY_VIOLATION};
use crate::models::{Label, Status, Task, TaskFilter, User};

const USER_COLUMNS: &str = "id, email, first_name, last_name, password_hash, created_at";
const TASK_COLUMNS: &str = "id, name, description, status_id, author_id, executor_id, created_at";

/// Maps a foreign-key violation raised while writing `task` to the reference that
/// no longer resolves; other errors convert as usual.
fn task_reference_error(task: &Task, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            match (db_err.constraint(), &task.executor) {
                (Some("tasks_status_id_fkey"), _) => {
                    return AppError::InvalidReference {
                        kind: "Status",
                        id: task.status.id,
                    }
                }
                (Some("tasks_author_id_fkey"), _) => {
                    return AppError::InvalidReference {
                        kind: "User",
                        id: task.author.id,
                    }
                }
                (Some("tasks_executor_id_fkey"), Some(executor)) => {
                    return AppError::InvalidReference {
                        kind: "User",
                        id: executor.id,
                    }
                }
                _ => {}
            }
        }
    }
    AppError::from(err)
}

fn label_reference_error(label_id: Uuid, err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            AppError::InvalidReference {
                kind: "Label",
                id: label_id,
            }
        }
        _ => AppError::from(err),
    }
}

/// Postgres-backed repositories sharing one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    status_id: Uuid,
    author_id: Uuid,
    executor_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TaskLabelRow {
    task_id: Uuid,
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))
    }

    /// Resolves status, author, executor and labels for a batch of task rows
    /// with one query per referenced table.
    async fn hydrate(&self, rows: Vec<TaskRow>) -> AppResult<Vec<Task>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let task_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let status_ids: Vec<Uuid> = rows.iter().map(|r| r.status_id).collect();
        let user_ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|r| std::iter::once(r.author_id).chain(r.executor_id))
            .collect();

        let statuses: HashMap<Uuid, Status> = sqlx::query_as::<_, Status>(
            "SELECT id, name, created_at FROM statuses WHERE id = ANY($1)",
        )
        .bind(status_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

        let users: HashMap<Uuid, User> = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

        let mut labels: HashMap<Uuid, Vec<Label>> = HashMap::new();
        let label_rows = sqlx::query_as::<_, TaskLabelRow>(
            "SELECT tl.task_id, l.id, l.name, l.created_at
             FROM task_labels tl JOIN labels l ON l.id = tl.label_id
             WHERE tl.task_id = ANY($1)
             ORDER BY tl.position",
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;
        for row in label_rows {
            labels.entry(row.task_id).or_default().push(Label {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
            });
        }

        rows.into_iter()
            .map(|row| {
                let missing =
                    || AppError::InternalServerError(format!("task {} is dangling", row.id));
                Ok(Task {
                    id: row.id,
                    status: statuses.get(&row.status_id).cloned().ok_or_else(missing)?,
                    author: users.get(&row.author_id).cloned().ok_or_else(missing)?,
                    executor: match row.executor_id {
                        Some(id) => Some(users.get(&id).cloned().ok_or_else(missing)?),
                        None => None,
                    },
                    labels: labels.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                    description: row.description,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let saved = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET
                 email = EXCLUDED.email,
                 first_name = EXCLUDED.first_name,
                 last_name = EXCLUDED.last_name,
                 password_hash = EXCLUDED.password_hash
             RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StatusRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Status>> {
        let status =
            sqlx::query_as::<_, Status>("SELECT id, name, created_at FROM statuses WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(status)
    }

    async fn find_all(&self) -> AppResult<Vec<Status>> {
        let statuses = sqlx::query_as::<_, Status>(
            "SELECT id, name, created_at FROM statuses ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(statuses)
    }

    async fn save(&self, status: Status) -> AppResult<Status> {
        let saved = sqlx::query_as::<_, Status>(
            "INSERT INTO statuses (id, name, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name, created_at",
        )
        .bind(status.id)
        .bind(&status.name)
        .bind(status.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LabelRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Label>> {
        let label =
            sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(label)
    }

    async fn find_all(&self) -> AppResult<Vec<Label>> {
        let labels =
            sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;
        Ok(labels)
    }

    async fn save(&self, label: Label) -> AppResult<Label> {
        let saved = sqlx::query_as::<_, Label>(
            "INSERT INTO labels (id, name, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name, created_at",
        )
        .bind(label.id)
        .bind(&label.name)
        .bind(label.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all(&self, filter: Option<&TaskFilter>) -> AppResult<Vec<Task>> {
        let filter = filter.cloned().unwrap_or_default();

        // Conditions are appended only for the constraints that are set.
        let mut sql = format!("SELECT {} FROM tasks t", TASK_COLUMNS);
        let mut conditions: Vec<String> = Vec::new();
        let mut param_count = 1;

        if filter.status_id.is_some() {
            conditions.push(format!("t.status_id = ${}", param_count));
            param_count += 1;
        }
        if filter.executor_id.is_some() {
            conditions.push(format!("t.executor_id = ${}", param_count));
            param_count += 1;
        }
        if filter.author_id.is_some() {
            conditions.push(format!("t.author_id = ${}", param_count));
            param_count += 1;
        }
        if filter.label_id.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = ${})",
                param_count
            ));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.created_at DESC");

        let mut query_builder = sqlx::query_as::<_, TaskRow>(&sql);
        for id in [
            filter.status_id,
            filter.executor_id,
            filter.author_id,
            filter.label_id,
        ]
        .into_iter()
        .flatten()
        {
            query_builder = query_builder.bind(id);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn save(&self, task: Task) -> AppResult<Task> {
        let mut tx = self.pool.begin().await?;

        // author_id is written once and never updated.
        sqlx::query(
            "INSERT INTO tasks (id, name, description, status_id, author_id, executor_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 status_id = EXCLUDED.status_id,
                 executor_id = EXCLUDED.executor_id",
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status.id)
        .bind(task.author.id)
        .bind(task.executor.as_ref().map(|e| e.id))
        .bind(task.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| task_reference_error(&task, err))?;

        sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
            .bind(task.id)
            .execute(&mut *tx)
            .await?;

        for (position, label) in task.labels.iter().enumerate() {
            sqlx::query("INSERT INTO task_labels (task_id, label_id, position) VALUES ($1, $2, $3)")
                .bind(task.id)
                .bind(label.id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(|err| label_reference_error(label.id, err))?;
        }

        tx.commit().await?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
