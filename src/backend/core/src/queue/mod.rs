//! The priority queue: ordered, bounded, de-duplicated by content hash,
//! durable. One logical queue per scheduler, all sharing the same backing
//! store (in-memory for tests, Postgres in production) the way the teacher's
//! `jobs::queue` shares one `QueueBackend` trait between an in-memory and a
//! Redis implementation.

mod entry;
mod in_memory;
mod postgres;

pub use entry::EntryState;
pub use in_memory::InMemoryQueue;
pub use postgres::PostgresQueue;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::PrioritizedItem;
use crate::error::{Result, SchedulerError};

/// Per-scheduler admissibility configuration (the Python source's `Base`
/// class fields).
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// 0 means unbounded.
    pub maxsize: usize,
    pub allow_replace: bool,
    pub allow_updates: bool,
    pub allow_priority_updates: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            maxsize: 0,
            allow_replace: false,
            allow_updates: false,
            allow_priority_updates: true,
        }
    }
}

#[async_trait]
pub trait Queue: Send + Sync {
    /// Attempts to insert or replace `item` under `config`'s admissibility
    /// policy. On success returns the item as stored (its `id` may differ
    /// from the caller's if an existing entry was replaced in place).
    async fn push(&self, item: PrioritizedItem, config: &QueueConfig) -> Result<PrioritizedItem>;

    /// Removes and returns the minimum (priority, created_at) live item.
    async fn pop(&self, scheduler_id: &str) -> Result<PrioritizedItem>;

    async fn peek(&self, scheduler_id: &str, index: usize) -> Result<Option<PrioritizedItem>>;

    async fn remove(&self, scheduler_id: &str, id: Uuid) -> Result<()>;

    async fn qsize(&self, scheduler_id: &str) -> Result<usize>;

    async fn is_item_on_queue(&self, scheduler_id: &str, hash: &str) -> Result<bool>;

    async fn full(&self, scheduler_id: &str, maxsize: usize) -> Result<bool> {
        if maxsize == 0 {
            return Ok(false);
        }
        Ok(self.qsize(scheduler_id).await? >= maxsize)
    }

    async fn empty(&self, scheduler_id: &str) -> Result<bool> {
        Ok(self.qsize(scheduler_id).await? == 0)
    }
}

/// The push admissibility ladder shared by every `Queue` implementation:
/// accepted iff not already present, or present and any of the three allow-*
/// flags matches the kind of change being made.
pub(crate) fn check_admissibility(
    on_queue: bool,
    item_changed: bool,
    priority_changed: bool,
    config: &QueueConfig,
) -> Result<()> {
    let allowed = if !on_queue {
        true
    } else if config.allow_replace {
        true
    } else if config.allow_updates && item_changed {
        true
    } else if config.allow_priority_updates && priority_changed {
        true
    } else {
        false
    };

    if allowed {
        Ok(())
    } else {
        Err(SchedulerError::NotAllowed {
            on_queue,
            item_changed,
            priority_changed,
        })
    }
}
