//! The task store: a queryable, append-oriented history of every task ever
//! admitted to a queue. Shared process-wide, transactional, independent of
//! which scheduler or API request is reading or writing it.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryTaskStore;
pub use postgres::PostgresTaskStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Task, TaskStatus};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub scheduler_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn add(&self, task: Task) -> Result<Task>;

    /// Updates the status (and bumps `modified_at`) of an existing task.
    async fn update_status(&self, id: Uuid, status: TaskStatus, now: chrono::DateTime<chrono::Utc>) -> Result<()>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Task>>;

    /// Most recently created task for this hash, regardless of status.
    async fn get_by_hash(&self, hash: &str) -> Result<Option<Task>>;

    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64)>;
}
