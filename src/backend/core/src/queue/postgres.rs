use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{check_admissibility, Queue, QueueConfig};
use crate::domain::{PrioritizedItem, QueueItem, Task};
use crate::error::{Result, SchedulerError};

/// Durable `Queue` backed by Postgres. A push is one transaction spanning
/// both the `items` row (the live queue slot) and the `tasks` row (the
/// append-only history), satisfying the "transactional push" design note.
pub struct PostgresQueue {
    pool: PgPool,
}

impl PostgresQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &sqlx::postgres::PgRow) -> Result<PrioritizedItem> {
        let data: sqlx::types::Json<QueueItem> = row.try_get("data")?;
        Ok(PrioritizedItem {
            id: row.try_get("id")?,
            scheduler_id: row.try_get("scheduler_id")?,
            priority: row.try_get("priority")?,
            data: data.0,
            hash: row.try_get("hash")?,
            created_at: row.try_get("created_at")?,
            modified_at: row.try_get("modified_at")?,
        })
    }
}

#[async_trait]
impl Queue for PostgresQueue {
    async fn push(&self, item: PrioritizedItem, config: &QueueConfig) -> Result<PrioritizedItem> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT id, scheduler_id, priority, data, hash, created_at, modified_at \
             FROM items WHERE scheduler_id = $1 AND hash = $2 FOR UPDATE",
        )
        .bind(&item.scheduler_id)
        .bind(&item.hash)
        .fetch_optional(&mut *tx)
        .await?;

        let existing_item = existing.as_ref().map(Self::row_to_item).transpose()?;
        let on_queue = existing_item.is_some();

        if !on_queue && config.maxsize != 0 {
            let count: i64 = sqlx::query_scalar("SELECT count(*) FROM items WHERE scheduler_id = $1")
                .bind(&item.scheduler_id)
                .fetch_one(&mut *tx)
                .await?;
            if count as usize >= config.maxsize {
                return Err(SchedulerError::QueueFull);
            }
        }

        let item_changed = existing_item
            .as_ref()
            .map(|e| e.data != item.data)
            .unwrap_or(false);
        let priority_changed = existing_item
            .as_ref()
            .map(|e| e.priority != item.priority)
            .unwrap_or(false);

        check_admissibility(on_queue, item_changed, priority_changed, config)?;

        let now = Utc::now();
        let stored = if let Some(existing_item) = existing_item {
            sqlx::query(
                "UPDATE items SET priority = $1, data = $2, modified_at = $3 WHERE id = $4",
            )
            .bind(item.priority)
            .bind(sqlx::types::Json(&item.data))
            .bind(now)
            .bind(existing_item.id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE tasks SET p_item = $1, modified_at = $2 \
                 WHERE hash = $3 AND status NOT IN ('completed', 'failed') \
                 AND id = (SELECT id FROM tasks WHERE hash = $3 ORDER BY created_at DESC LIMIT 1)",
            )
            .bind(sqlx::types::Json(PrioritizedItem {
                id: existing_item.id,
                priority: item.priority,
                modified_at: now,
                ..item.clone()
            }))
            .bind(now)
            .bind(&item.hash)
            .execute(&mut *tx)
            .await?;

            PrioritizedItem {
                id: existing_item.id,
                modified_at: now,
                ..item
            }
        } else {
            sqlx::query(
                "INSERT INTO items (id, scheduler_id, priority, data, hash, created_at, modified_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $6)",
            )
            .bind(item.id)
            .bind(&item.scheduler_id)
            .bind(item.priority)
            .bind(sqlx::types::Json(&item.data))
            .bind(&item.hash)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            let task = Task::new(item.clone(), item.created_at);
            sqlx::query(
                "INSERT INTO tasks (id, scheduler_id, hash, p_item, status, created_at, modified_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $6)",
            )
            .bind(task.id)
            .bind(&task.scheduler_id)
            .bind(&item.hash)
            .bind(sqlx::types::Json(&task.p_item))
            .bind(task.status)
            .bind(task.created_at)
            .execute(&mut *tx)
            .await?;

            item
        };

        tx.commit().await?;
        Ok(stored)
    }

    async fn pop(&self, scheduler_id: &str) -> Result<PrioritizedItem> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, scheduler_id, priority, data, hash, created_at, modified_at FROM items \
             WHERE scheduler_id = $1 ORDER BY priority ASC, created_at ASC LIMIT 1 FOR UPDATE SKIP LOCKED",
        )
        .bind(scheduler_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(SchedulerError::QueueEmpty);
        };
        let item = Self::row_to_item(&row)?;

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn peek(&self, scheduler_id: &str, index: usize) -> Result<Option<PrioritizedItem>> {
        let row = sqlx::query(
            "SELECT id, scheduler_id, priority, data, hash, created_at, modified_at FROM items \
             WHERE scheduler_id = $1 ORDER BY priority ASC, created_at ASC OFFSET $2 LIMIT 1",
        )
        .bind(scheduler_id)
        .bind(index as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn remove(&self, scheduler_id: &str, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM items WHERE scheduler_id = $1 AND id = $2")
            .bind(scheduler_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn qsize(&self, scheduler_id: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM items WHERE scheduler_id = $1")
            .bind(scheduler_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn is_item_on_queue(&self, scheduler_id: &str, hash: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT exists(SELECT 1 FROM items WHERE scheduler_id = $1 AND hash = $2)",
        )
        .bind(scheduler_id)
        .bind(hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
