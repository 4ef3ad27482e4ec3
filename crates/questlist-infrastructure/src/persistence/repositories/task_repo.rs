use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use questlist_domain::shared::{DomainError, TaskId, UserId};
use questlist_domain::task::{Difficulty, TaskRecord, TaskRepository};

use crate::persistence::SqliteRepositoryBase;

#[derive(FromRow)]
struct TaskRow {
    id: String,
    owner_id: String,
    title: String,
    description: Option<String>,
    category: String,
    difficulty: String,
    completed: bool,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_record(self) -> Result<TaskRecord, DomainError> {
        Ok(TaskRecord::restore(
            TaskId::from_string(&self.id),
            UserId::from_string(&self.owner_id),
            self.title,
            self.description,
            self.category,
            Difficulty::from_str(&self.difficulty)?,
            self.completed,
            self.due_date,
            self.created_at,
        ))
    }
}

const SELECT_COLUMNS: &str =
    "id, owner_id, title, description, category, difficulty, completed, due_date, created_at";

/// SQLite-backed task store with per-owner watch channels.
pub struct SqliteTaskRepository {
    base: SqliteRepositoryBase,
    owner_channels: RwLock<HashMap<String, watch::Sender<Vec<TaskRecord>>>>,
}

impl SqliteTaskRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            base: SqliteRepositoryBase::new(pool),
            owner_channels: RwLock::new(HashMap::new()),
        }
    }

    async fn load_by_owner(&self, owner_id: &UserId) -> Result<Vec<TaskRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM tasks WHERE owner_id = ?1 ORDER BY created_at ASC",
            SELECT_COLUMNS
        );
        let rows: Vec<TaskRow> = self
            .base
            .fetch_all(
                sqlx::query_as(&query).bind(owner_id.as_str()),
                "Find tasks by owner",
            )
            .await?;
        rows.into_iter().map(|r| r.into_record()).collect()
    }

    async fn notify(&self, owner_id: &UserId) -> Result<(), DomainError> {
        let channels = self.owner_channels.read().await;
        if let Some(sender) = channels.get(owner_id.as_str()) {
            sender.send_replace(self.load_by_owner(owner_id).await?);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn observe(
        &self,
        owner_id: &UserId,
    ) -> Result<watch::Receiver<Vec<TaskRecord>>, DomainError> {
        let mut channels = self.owner_channels.write().await;
        if let Some(sender) = channels.get(owner_id.as_str()) {
            return Ok(sender.subscribe());
        }

        let snapshot = self.load_by_owner(owner_id).await?;
        let (sender, receiver) = watch::channel(snapshot);
        channels.insert(owner_id.as_str().to_string(), sender);
        Ok(receiver)
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<TaskRecord>, DomainError> {
        self.load_by_owner(owner_id).await
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<TaskRecord>, DomainError> {
        let query = format!("SELECT {} FROM tasks WHERE id = ?1", SELECT_COLUMNS);
        let row: Option<TaskRow> = self
            .base
            .fetch_optional(sqlx::query_as(&query).bind(id.as_str()), "Find task by ID")
            .await?;
        row.map(|r| r.into_record()).transpose()
    }

    async fn insert(&self, task: &TaskRecord) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO tasks (id, owner_id, title, description, category,
                               difficulty, completed, due_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(task.id().as_str())
                    .bind(task.owner_id().as_str())
                    .bind(task.title())
                    .bind(task.description())
                    .bind(task.category())
                    .bind(task.difficulty().as_str())
                    .bind(task.is_completed())
                    .bind(task.due_date())
                    .bind(task.created_at()),
                "Insert task",
            )
            .await?;
        self.notify(task.owner_id()).await
    }

    async fn update(&self, task: &TaskRecord) -> Result<(), DomainError> {
        let query = r#"
            UPDATE tasks SET
                title = ?2,
                description = ?3,
                category = ?4,
                difficulty = ?5,
                completed = ?6,
                due_date = ?7
            WHERE id = ?1
        "#;

        self.base
            .execute(
                sqlx::query(query)
                    .bind(task.id().as_str())
                    .bind(task.title())
                    .bind(task.description())
                    .bind(task.category())
                    .bind(task.difficulty().as_str())
                    .bind(task.is_completed())
                    .bind(task.due_date()),
                "Update task",
            )
            .await?;
        self.notify(task.owner_id()).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), DomainError> {
        // Owner is needed for the post-delete notification.
        let owner = self.find_by_id(id).await?.map(|t| t.owner_id().clone());

        self.base
            .execute(
                sqlx::query("DELETE FROM tasks WHERE id = ?1").bind(id.as_str()),
                "Delete task",
            )
            .await?;

        if let Some(owner_id) = owner {
            self.notify(&owner_id).await?;
        }
        Ok(())
    }
}
