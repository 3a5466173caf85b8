use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{TaskFilter, TaskStore};
use crate::domain::{Task, TaskStatus};
use crate::error::Result;

/// Non-durable `TaskStore` used by tests.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn add(&self, task: Task) -> Result<Task> {
        self.tasks.write().push(task.clone());
        Ok(task)
    }

    async fn update_status(&self, id: Uuid, status: TaskStatus, now: DateTime<Utc>) -> Result<()> {
        let mut tasks = self.tasks.write();
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
            task.status = status;
            task.modified_at = now;
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.read().iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Option<Task>> {
        Ok(self
            .tasks
            .read()
            .iter()
            .filter(|t| t.hash() == hash)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64)> {
        let tasks = self.tasks.read();
        let mut matching: Vec<&Task> = tasks
            .iter()
            .filter(|t| {
                filter
                    .scheduler_id
                    .as_ref()
                    .map(|s| s == &t.scheduler_id)
                    .unwrap_or(true)
                    && filter.status.map(|s| s == t.status).unwrap_or(true)
            })
            .collect();
        matching.sort_by_key(|t| std::cmp::Reverse(t.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(if filter.limit <= 0 { usize::MAX } else { filter.limit as usize })
            .cloned()
            .collect();

        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoefjeTask, PrioritizedItem, QueueItem};

    fn task() -> Task {
        let data = QueueItem::Boefje(BoefjeTask {
            boefje_id: "b1".to_string(),
            input_ooi: "ooi-a".to_string(),
            organization: "org1".to_string(),
        });
        let item = PrioritizedItem::new("s1", 5, data, Utc::now());
        Task::new(item, Utc::now())
    }

    #[tokio::test]
    async fn at_most_one_non_terminal_task_per_hash_is_caller_enforced() {
        let store = InMemoryTaskStore::new();
        let t = task();
        let hash = t.hash().to_string();
        store.add(t).await.unwrap();
        let found = store.get_by_hash(&hash).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().status, TaskStatus::Queued);
    }

    #[tokio::test]
    async fn update_status_transitions_task() {
        let store = InMemoryTaskStore::new();
        let t = store.add(task()).await.unwrap();
        store.update_status(t.id, TaskStatus::Completed, Utc::now()).await.unwrap();
        let fetched = store.get_by_id(t.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn list_filters_by_scheduler_and_status() {
        let store = InMemoryTaskStore::new();
        store.add(task()).await.unwrap();
        let (items, total) = store
            .list(&TaskFilter {
                scheduler_id: Some("s1".to_string()),
                status: Some(TaskStatus::Failed),
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 0);
        assert!(items.is_empty());
    }
}
