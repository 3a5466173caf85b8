//! Concrete boefje populate strategy: drains the scan-level mutation
//! stream, fans out newly enabled boefjes, and reschedules stale objects,
//! each candidate passing through the full six-point admissibility check
//! before being persisted and pushed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::clients::{BlobStoreClient, CatalogueClient, InventoryClient, Message, MessageBroker, PluginCache};
use crate::domain::{BoefjeTask, Ooi, Organisation, Plugin, PrioritizedItem, QueueItem, Task};
use crate::error::Result;
use crate::queue::{Queue, QueueConfig};
use crate::ranker::{BoefjeRankContext, BoefjeRanker, Ranker};
use crate::store::TaskStore;

use super::{wait_for_space, SchedulerEntity};

#[derive(Deserialize)]
struct ScanProfileMutation {
    ooi_primary_key: String,
}

pub struct BoefjeScheduler {
    pub entity: SchedulerEntity,
    queue: Arc<dyn Queue>,
    task_store: Arc<dyn TaskStore>,
    catalogue: Arc<dyn CatalogueClient>,
    inventory: Arc<dyn InventoryClient>,
    blob_store: Arc<dyn BlobStoreClient>,
    broker: Arc<dyn MessageBroker>,
    plugin_cache: Arc<PluginCache>,
    queue_config: QueueConfig,
    grace_period_secs: i64,
    /// Scale constant fed to `BoefjeRanker`, independent of the queue's own
    /// `maxsize` bound so that an unbounded queue (`queue_config.maxsize ==
    /// 0`, the default) doesn't collapse the exponential-decay ranking to a
    /// flat score.
    rank_scale: i64,
    backoff: Duration,
    known_boefje_ids: Mutex<HashSet<String>>,
}

#[allow(clippy::too_many_arguments)]
impl BoefjeScheduler {
    pub fn new(
        organisation: Organisation,
        queue: Arc<dyn Queue>,
        task_store: Arc<dyn TaskStore>,
        catalogue: Arc<dyn CatalogueClient>,
        inventory: Arc<dyn InventoryClient>,
        blob_store: Arc<dyn BlobStoreClient>,
        broker: Arc<dyn MessageBroker>,
        plugin_cache: Arc<PluginCache>,
        queue_config: QueueConfig,
        grace_period_secs: i64,
        rank_scale: i64,
        backoff: Duration,
    ) -> Self {
        let id = format!("boefje-{}", organisation.id);
        Self {
            entity: SchedulerEntity::new(id, organisation),
            queue,
            task_store,
            catalogue,
            inventory,
            blob_store,
            broker,
            plugin_cache,
            queue_config,
            grace_period_secs,
            rank_scale,
            backoff,
            known_boefje_ids: Mutex::new(HashSet::new()),
        }
    }

    fn org_id(&self) -> &str {
        &self.entity.organisation.id
    }

    async fn plugins_for_org(&self, now: DateTime<Utc>) -> Result<Vec<Plugin>> {
        if let Some(cached) = self.plugin_cache.get(self.org_id(), now) {
            return Ok(cached);
        }
        let plugins = self.catalogue.list_plugins(self.org_id()).await?;
        self.plugin_cache.set(self.org_id(), plugins.clone(), now);
        Ok(plugins)
    }

    async fn enabled_boefjes(&self, now: DateTime<Utc>) -> Result<Vec<Plugin>> {
        Ok(self
            .plugins_for_org(now)
            .await?
            .into_iter()
            .filter(|p| p.is_boefje() && p.enabled)
            .collect())
    }

    fn boefje_consumes(boefje: &Plugin, ooi: &Ooi) -> bool {
        boefje.consumes.iter().any(|t| t == &ooi.object_type)
    }

    /// Runs the full six-point admissibility check for `(boefje, ooi)` and,
    /// if it passes, persists and pushes the task. A failing check is a
    /// silent drop (logged), never an error — per the candidate generation
    /// rules in the component design.
    async fn try_admit_candidate(&self, boefje: &Plugin, ooi: &Ooi, now: DateTime<Utc>) -> Result<()> {
        // 1. boefje.enabled
        if !boefje.enabled {
            return Ok(());
        }
        // 2. scan level clearance
        let Some(profile) = ooi.scan_profile else {
            return Ok(());
        };
        let Some(scan_level) = boefje.scan_level() else {
            return Ok(());
        };
        if profile.level < scan_level {
            return Ok(());
        }

        let candidate = BoefjeTask {
            boefje_id: boefje.id.clone(),
            input_ooi: ooi.primary_key.clone(),
            organization: self.org_id().to_string(),
        };
        let hash = candidate.hash();

        // 3. no live queue item with this hash
        if self.queue.is_item_on_queue(&self.entity.id, &hash).await? {
            return Ok(());
        }

        // 4. no prior non-terminal task with this hash
        if let Some(prior) = self.task_store.get_by_hash(&hash).await? {
            if !prior.status.is_terminal() {
                return Ok(());
            }
        }

        // 5. grace period against the blob store's last-run record
        let last_run = match self.blob_store.get_last_run(&boefje.id, &ooi.primary_key, self.org_id()).await {
            Ok(v) => v,
            Err(e) if e.is_candidate_local() => {
                tracing::warn!(boefje = %boefje.id, ooi = %ooi.primary_key, error = %e, "blob store lookup failed, dropping candidate");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let last_run_ended_at = match last_run {
            None => None,
            Some(meta) => match meta.ended_at {
                None => return Ok(()),
                Some(ended_at) => {
                    if now.signed_duration_since(ended_at).num_seconds() < self.grace_period_secs {
                        return Ok(());
                    }
                    Some(ended_at)
                }
            },
        };

        // 6. ranker
        let score = BoefjeRanker.rank(&BoefjeRankContext {
            last_run_ended_at,
            now,
            maxsize: self.rank_scale,
            grace_period_secs: self.grace_period_secs,
        });
        if score < 0 {
            return Ok(());
        }

        wait_for_space(self.queue.as_ref(), &self.entity.id, self.queue_config.maxsize, 1, self.backoff).await?;

        let item = PrioritizedItem::new(&self.entity.id, score, QueueItem::Boefje(candidate), now);
        let task = Task::new(item.clone(), now);
        self.task_store.add(task).await?;
        self.queue.push(item, &self.queue_config).await?;
        Ok(())
    }

    /// (A) Drains one mutation at a time from the organisation's
    /// `scan_profile_mutations` subject until the stream yields nothing.
    async fn drain_scan_profile_mutations(&self, now: DateTime<Utc>) -> Result<()> {
        let subject = Message::scan_profile_mutations(self.org_id());
        loop {
            let message = match self.broker.poll(&subject).await {
                Ok(Some(m)) => m,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(org = self.org_id(), error = %e, "broker poll failed, ending drain this tick");
                    break;
                }
            };

            let mutation: ScanProfileMutation = match serde_json::from_value(message.body.clone()) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed scan profile mutation, acking and dropping");
                    self.broker.ack(&message).await?;
                    continue;
                }
            };

            let ooi = match self.inventory.get_object(self.org_id(), &mutation.ooi_primary_key).await {
                Ok(v) => v,
                Err(e) if e.is_candidate_local() => {
                    tracing::warn!(error = %e, "inventory lookup failed for mutation, skipping");
                    self.broker.ack(&message).await?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(ooi) = ooi {
                let boefjes = self.enabled_boefjes(now).await?;
                for boefje in boefjes.iter().filter(|b| Self::boefje_consumes(b, &ooi)) {
                    self.try_admit_candidate(boefje, &ooi, now).await?;
                }
            }

            self.broker.ack(&message).await?;
        }
        Ok(())
    }

    /// (B) Pushes candidates for boefjes enabled since the last tick,
    /// against every known OOI of a type they consume.
    async fn new_boefje_fanout(&self, now: DateTime<Utc>) -> Result<()> {
        let current = self.enabled_boefjes(now).await?;
        let current_ids: HashSet<String> = current.iter().map(|b| b.id.clone()).collect();

        let new_boefjes: Vec<Plugin> = {
            let known = self.known_boefje_ids.lock();
            current.iter().filter(|b| !known.contains(&b.id)).cloned().collect()
        };

        if !new_boefjes.is_empty() {
            let oois = self.inventory.list_objects(self.org_id()).await?;
            for boefje in &new_boefjes {
                for ooi in oois.iter().filter(|o| Self::boefje_consumes(boefje, o)) {
                    self.try_admit_candidate(boefje, ooi, now).await?;
                }
            }
        }

        *self.known_boefje_ids.lock() = current_ids;
        Ok(())
    }

    /// (C) Reschedules objects whose `checked_at` has aged past the grace
    /// period. We keep no local mirror of the inventory, so "no longer
    /// present" objects never appear in `stale_objects`'s result in the
    /// first place; the delete-locally step in the original source is
    /// vacuous under this architecture.
    async fn reschedule_stale_objects(&self, now: DateTime<Utc>) -> Result<()> {
        let cutoff = now - chrono::Duration::seconds(self.grace_period_secs);
        let stale = self.inventory.stale_objects(self.org_id(), cutoff).await?;
        if stale.is_empty() {
            return Ok(());
        }
        let boefjes = self.enabled_boefjes(now).await?;
        for ooi in &stale {
            for boefje in boefjes.iter().filter(|b| Self::boefje_consumes(b, ooi)) {
                self.try_admit_candidate(boefje, ooi, now).await?;
            }
        }
        Ok(())
    }

    /// One populate tick: sources A, B, C in order, skipped entirely when
    /// `populate_enabled` is false.
    pub async fn populate_tick(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.entity.is_populate_enabled() {
            return Ok(());
        }
        self.drain_scan_profile_mutations(now).await?;
        self.new_boefje_fanout(now).await?;
        self.reschedule_stale_objects(now).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InMemoryBlobStoreClient, InMemoryBroker, InMemoryCatalogueClient, InMemoryInventoryClient};
    use crate::domain::{BoefjeMeta, PluginKind, ScanProfile};
    use crate::queue::InMemoryQueue;
    use crate::store::InMemoryTaskStore;
    use std::time::Duration as StdDuration;

    fn boefje(id: &str, scan_level: u8, consumes: &[&str]) -> Plugin {
        Plugin {
            id: id.to_string(),
            kind: PluginKind::Boefje { scan_level },
            enabled: true,
            consumes: consumes.iter().map(|s| s.to_string()).collect(),
            produces: vec!["text/plain".to_string()],
        }
    }

    fn ooi(primary_key: &str, object_type: &str, level: u8) -> Ooi {
        Ooi {
            primary_key: primary_key.to_string(),
            object_type: object_type.to_string(),
            scan_profile: Some(ScanProfile { level }),
            checked_at: Some(Utc::now()),
        }
    }

    fn build_scheduler(org_id: &str) -> (Arc<BoefjeScheduler>, Arc<InMemoryCatalogueClient>, Arc<InMemoryInventoryClient>, Arc<InMemoryBlobStoreClient>) {
        let org = Organisation { id: org_id.to_string(), name: org_id.to_string() };
        let catalogue = Arc::new(InMemoryCatalogueClient::default());
        let inventory = Arc::new(InMemoryInventoryClient::default());
        let blob_store = Arc::new(InMemoryBlobStoreClient::default());
        let broker = Arc::new(InMemoryBroker::default());
        let queue = Arc::new(InMemoryQueue::default());
        let task_store = Arc::new(InMemoryTaskStore::default());
        let plugin_cache = Arc::new(PluginCache::new(StdDuration::from_secs(60)));

        let scheduler = Arc::new(BoefjeScheduler::new(
            org,
            queue,
            task_store,
            catalogue.clone(),
            inventory.clone(),
            blob_store.clone(),
            broker,
            plugin_cache,
            QueueConfig::default(),
            60,
            1000,
            StdDuration::from_millis(1),
        ));
        (scheduler, catalogue, inventory, blob_store)
    }

    #[tokio::test]
    async fn scan_level_gating_admits_only_matching_boefje() {
        let (scheduler, catalogue, inventory, _blob_store) = build_scheduler("org-1");
        catalogue.plugins.write().insert(
            "org-1".to_string(),
            vec![boefje("b-heavy", 3, &["host"]), boefje("b-light", 1, &["host"])],
        );
        inventory.objects.write().insert("org-1".to_string(), vec![ooi("ooi-A", "host", 1)]);

        scheduler.populate_tick(Utc::now()).await.unwrap();

        assert!(scheduler.queue.is_item_on_queue(&scheduler.entity.id, &BoefjeTask {
            boefje_id: "b-light".to_string(),
            input_ooi: "ooi-A".to_string(),
            organization: "org-1".to_string(),
        }.hash()).await.unwrap());
        assert!(!scheduler.queue.is_item_on_queue(&scheduler.entity.id, &BoefjeTask {
            boefje_id: "b-heavy".to_string(),
            input_ooi: "ooi-A".to_string(),
            organization: "org-1".to_string(),
        }.hash()).await.unwrap());
        assert_eq!(scheduler.queue.qsize(&scheduler.entity.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn grace_period_blocks_then_admits() {
        let (scheduler, catalogue, inventory, blob_store) = build_scheduler("org-1");
        catalogue.plugins.write().insert("org-1".to_string(), vec![boefje("b-light", 1, &["host"])]);
        inventory.objects.write().insert("org-1".to_string(), vec![ooi("ooi-A", "host", 1)]);

        let now = Utc::now();
        blob_store.insert(
            "b-light",
            "ooi-A",
            "org-1",
            BoefjeMeta {
                id: "meta-1".to_string(),
                boefje_id: "b-light".to_string(),
                input_ooi: "ooi-A".to_string(),
                organization: "org-1".to_string(),
                started_at: Some(now - chrono::Duration::seconds(31)),
                ended_at: Some(now - chrono::Duration::seconds(30)),
            },
        );

        scheduler.populate_tick(now).await.unwrap();
        assert_eq!(scheduler.queue.qsize(&scheduler.entity.id).await.unwrap(), 0);

        let later = now + chrono::Duration::seconds(120);
        scheduler.populate_tick(later).await.unwrap();
        assert_eq!(scheduler.queue.qsize(&scheduler.entity.id).await.unwrap(), 1);
        let popped = scheduler.queue.pop(&scheduler.entity.id).await.unwrap();
        assert!(popped.priority >= 3);
    }
}
