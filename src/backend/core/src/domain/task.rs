use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::prioritized_item::PrioritizedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Dispatched,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// A persisted, append-oriented record of a task's lifecycle. The store
/// does not enforce the `queued -> dispatched -> running -> {completed,
/// failed}` transition order; the schedulers that own each edge do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub scheduler_id: String,
    pub p_item: PrioritizedItem,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Task {
    pub fn new(p_item: PrioritizedItem, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduler_id: p_item.scheduler_id.clone(),
            p_item,
            status: TaskStatus::Queued,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn hash(&self) -> &str {
        &self.p_item.hash
    }
}
