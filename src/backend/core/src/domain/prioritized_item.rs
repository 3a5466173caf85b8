use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tasks::QueueItem;

/// An item resident in a priority queue. `hash` is unique among *live*
/// items for a given `scheduler_id` — the invariant the queue enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedItem {
    pub id: Uuid,
    pub scheduler_id: String,
    pub priority: i64,
    pub data: QueueItem,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl PrioritizedItem {
    pub fn new(scheduler_id: impl Into<String>, priority: i64, data: QueueItem, now: DateTime<Utc>) -> Self {
        let hash = data.hash();
        Self {
            id: Uuid::new_v4(),
            scheduler_id: scheduler_id.into(),
            priority,
            data,
            hash,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Ordering used by the binary heap backing a single scheduler's queue:
/// priority ascending, ties broken by creation time ascending (FIFO).
impl Eq for PrioritizedItem {}

impl Ord for PrioritizedItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.created_at.cmp(&other.created_at))
    }
}

impl PartialOrd for PrioritizedItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
