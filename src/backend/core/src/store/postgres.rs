use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{TaskFilter, TaskStore};
use crate::domain::{PrioritizedItem, Task, TaskStatus};
use crate::error::Result;

pub struct PostgresTaskStore {
    pool: PgPool,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::postgres::PgRow) -> Result<Task> {
        let p_item: sqlx::types::Json<PrioritizedItem> = row.try_get("p_item")?;
        Ok(Task {
            id: row.try_get("id")?,
            scheduler_id: row.try_get("scheduler_id")?,
            p_item: p_item.0,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            modified_at: row.try_get("modified_at")?,
        })
    }
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn add(&self, task: Task) -> Result<Task> {
        sqlx::query(
            "INSERT INTO tasks (id, scheduler_id, hash, p_item, status, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(task.id)
        .bind(&task.scheduler_id)
        .bind(task.hash())
        .bind(sqlx::types::Json(&task.p_item))
        .bind(task.status)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_status(&self, id: Uuid, status: TaskStatus, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE tasks SET status = $1, modified_at = $2 WHERE id = $3")
            .bind(status)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, scheduler_id, p_item, status, created_at, modified_at FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, scheduler_id, p_item, status, created_at, modified_at FROM tasks \
             WHERE hash = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64)> {
        let scheduler_id = filter.scheduler_id.as_deref();
        let status = filter.status;

        let rows = sqlx::query(
            "SELECT id, scheduler_id, p_item, status, created_at, modified_at FROM tasks \
             WHERE ($1::text IS NULL OR scheduler_id = $1) \
             AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC OFFSET $3 LIMIT $4",
        )
        .bind(scheduler_id)
        .bind(status)
        .bind(filter.offset)
        .bind(if filter.limit <= 0 { i64::MAX } else { filter.limit })
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM tasks WHERE ($1::text IS NULL OR scheduler_id = $1) \
             AND ($2::text IS NULL OR status = $2)",
        )
        .bind(scheduler_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let tasks = rows.iter().map(Self::row_to_task).collect::<Result<Vec<_>>>()?;
        Ok((tasks, total))
    }
}
