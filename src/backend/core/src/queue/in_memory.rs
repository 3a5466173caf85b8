use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{check_admissibility, Queue, QueueConfig};
use crate::domain::PrioritizedItem;
use crate::error::{Result, SchedulerError};

struct HeapEntry {
    item: PrioritizedItem,
    removed: Arc<AtomicBool>,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.item.cmp(&other.item)
    }
}

#[derive(Default)]
struct SchedulerState {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    /// The authoritative current item for each live hash.
    live: HashMap<String, PrioritizedItem>,
    /// Shared removal flag for each live hash's heap slot.
    flags: HashMap<String, Arc<AtomicBool>>,
}

/// A non-durable `Queue` backed entirely by in-process binary heaps, used
/// by tests and anywhere a database is unavailable. Mirrors the lazy
/// deletion (`EntryState::Added`/`Removed`) scheme of the original
/// in-memory priority queue: a replaced or removed entry's heap slot is
/// flagged rather than spliced out, and skipped on pop.
#[derive(Default)]
pub struct InMemoryQueue {
    schedulers: DashMap<String, Mutex<SchedulerState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn push(&self, item: PrioritizedItem, config: &QueueConfig) -> Result<PrioritizedItem> {
        let entry = self.schedulers.entry(item.scheduler_id.clone()).or_default();
        let mut state = entry.lock();

        if config.maxsize != 0 && state.live.len() >= config.maxsize && !state.live.contains_key(&item.hash) {
            return Err(SchedulerError::QueueFull);
        }

        let existing = state.live.get(&item.hash).cloned();
        let on_queue = existing.is_some();
        let item_changed = existing.as_ref().map(|e| e.data != item.data).unwrap_or(false);
        let priority_changed = existing.as_ref().map(|e| e.priority != item.priority).unwrap_or(false);

        check_admissibility(on_queue, item_changed, priority_changed, config)?;

        if let Some(flag) = state.flags.remove(&item.hash) {
            flag.store(true, Ordering::SeqCst);
        }

        let flag = Arc::new(AtomicBool::new(false));
        state.flags.insert(item.hash.clone(), flag.clone());
        state.live.insert(item.hash.clone(), item.clone());
        state.heap.push(Reverse(HeapEntry {
            item: item.clone(),
            removed: flag,
        }));

        Ok(item)
    }

    async fn pop(&self, scheduler_id: &str) -> Result<PrioritizedItem> {
        let entry = self.schedulers.entry(scheduler_id.to_string()).or_default();
        let mut state = entry.lock();

        loop {
            let Some(Reverse(candidate)) = state.heap.pop() else {
                return Err(SchedulerError::QueueEmpty);
            };
            if candidate.removed.load(Ordering::SeqCst) {
                continue;
            }
            state.live.remove(&candidate.item.hash);
            state.flags.remove(&candidate.item.hash);
            return Ok(candidate.item);
        }
    }

    async fn peek(&self, scheduler_id: &str, index: usize) -> Result<Option<PrioritizedItem>> {
        let Some(entry) = self.schedulers.get(scheduler_id) else {
            return Ok(None);
        };
        let state = entry.lock();
        let mut items: Vec<&PrioritizedItem> = state.live.values().collect();
        items.sort();
        Ok(items.get(index).map(|i| (*i).clone()))
    }

    async fn remove(&self, scheduler_id: &str, id: Uuid) -> Result<()> {
        let Some(entry) = self.schedulers.get(scheduler_id) else {
            return Ok(());
        };
        let mut state = entry.lock();
        if let Some(hash) = state.live.iter().find(|(_, v)| v.id == id).map(|(k, _)| k.clone()) {
            state.live.remove(&hash);
            if let Some(flag) = state.flags.remove(&hash) {
                flag.store(true, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn qsize(&self, scheduler_id: &str) -> Result<usize> {
        Ok(self
            .schedulers
            .get(scheduler_id)
            .map(|e| e.lock().live.len())
            .unwrap_or(0))
    }

    async fn is_item_on_queue(&self, scheduler_id: &str, hash: &str) -> Result<bool> {
        Ok(self
            .schedulers
            .get(scheduler_id)
            .map(|e| e.lock().live.contains_key(hash))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoefjeTask, QueueItem};
    use chrono::Utc;

    fn item(scheduler_id: &str, boefje: &str, ooi: &str, org: &str, priority: i64) -> PrioritizedItem {
        let data = QueueItem::Boefje(BoefjeTask {
            boefje_id: boefje.to_string(),
            input_ooi: ooi.to_string(),
            organization: org.to_string(),
        });
        PrioritizedItem::new(scheduler_id, priority, data, Utc::now())
    }

    #[tokio::test]
    async fn push_then_pop_restores_empty_queue() {
        let q = InMemoryQueue::new();
        let cfg = QueueConfig::default();
        let pushed = q.push(item("s1", "b", "ooi-a", "org1", 5), &cfg).await.unwrap();
        assert_eq!(q.qsize("s1").await.unwrap(), 1);
        let popped = q.pop("s1").await.unwrap();
        assert_eq!(popped.hash, pushed.hash);
        assert_eq!(q.qsize("s1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn pop_returns_min_priority_then_min_created_at() {
        let q = InMemoryQueue::new();
        let cfg = QueueConfig::default();
        q.push(item("s1", "b", "ooi-a", "org1", 10), &cfg).await.unwrap();
        q.push(item("s1", "b", "ooi-b", "org1", 5), &cfg).await.unwrap();
        let first = q.pop("s1").await.unwrap();
        assert_eq!(first.priority, 5);
    }

    #[tokio::test]
    async fn duplicate_push_without_allow_replace_is_not_allowed() {
        let q = InMemoryQueue::new();
        let cfg = QueueConfig::default();
        q.push(item("s1", "b", "ooi-a", "org1", 5), &cfg).await.unwrap();
        let err = q.push(item("s1", "b", "ooi-a", "org1", 5), &cfg).await.unwrap_err();
        assert!(matches!(err, SchedulerError::NotAllowed { .. }));
        assert_eq!(q.qsize("s1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn priority_update_replaces_in_place() {
        let q = InMemoryQueue::new();
        let cfg = QueueConfig {
            allow_priority_updates: true,
            ..QueueConfig::default()
        };
        q.push(item("s1", "b", "ooi-a", "org1", 100), &cfg).await.unwrap();
        q.push(item("s1", "b", "ooi-a", "org1", 5), &cfg).await.unwrap();
        assert_eq!(q.qsize("s1").await.unwrap(), 1);
        let head = q.peek("s1", 0).await.unwrap().unwrap();
        assert_eq!(head.priority, 5);
    }

    #[tokio::test]
    async fn full_queue_rejects_new_hash() {
        let q = InMemoryQueue::new();
        let cfg = QueueConfig {
            maxsize: 1,
            ..QueueConfig::default()
        };
        q.push(item("s1", "b", "ooi-a", "org1", 1), &cfg).await.unwrap();
        let err = q.push(item("s1", "b", "ooi-b", "org1", 1), &cfg).await.unwrap_err();
        assert!(matches!(err, SchedulerError::QueueFull));
        assert_eq!(q.qsize("s1").await.unwrap(), 1);
    }
}
