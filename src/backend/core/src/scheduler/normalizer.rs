//! Concrete normalizer populate strategy: two independent routines, R1
//! ingesting raw data and emitting normalizer tasks, R2 ingesting
//! normalizer-completion events.

use std::sync::Arc;
use uuid::Uuid;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::clients::{CatalogueClient, Message, MessageBroker};
use crate::domain::{NormalizerTask, Organisation, Plugin, PrioritizedItem, QueueItem, RawData, Task, TaskStatus};
use crate::error::Result;
use crate::queue::{Queue, QueueConfig};
use crate::ranker::{NormalizerRanker, Ranker};
use crate::store::TaskStore;

use super::SchedulerEntity;

#[derive(Deserialize)]
struct RawFileReceived {
    boefje_task_id: Uuid,
    raw_data: RawData,
}

#[derive(Deserialize)]
struct NormalizerMetaReceived {
    normalizer_task_id: Uuid,
}

pub struct NormalizerScheduler {
    pub entity: SchedulerEntity,
    queue: Arc<dyn Queue>,
    task_store: Arc<dyn TaskStore>,
    catalogue: Arc<dyn CatalogueClient>,
    broker: Arc<dyn MessageBroker>,
    queue_config: QueueConfig,
}

impl NormalizerScheduler {
    pub fn new(
        organisation: Organisation,
        queue: Arc<dyn Queue>,
        task_store: Arc<dyn TaskStore>,
        catalogue: Arc<dyn CatalogueClient>,
        broker: Arc<dyn MessageBroker>,
        queue_config: QueueConfig,
    ) -> Self {
        let id = format!("normalizer-{}", organisation.id);
        Self {
            entity: SchedulerEntity::new(id, organisation),
            queue,
            task_store,
            catalogue,
            broker,
            queue_config,
        }
    }

    fn org_id(&self) -> &str {
        &self.entity.organisation.id
    }

    /// R1: pulls one `raw_file_received` message, marks the producing
    /// boefje task completed or failed, and on success fans out normalizer
    /// tasks for every MIME type attached to the raw data.
    pub async fn ingest_raw_data(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.entity.is_populate_enabled() {
            return Ok(());
        }
        let subject = Message::raw_file_received(self.org_id());
        let message = match self.broker.poll(&subject).await {
            Ok(Some(m)) => m,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(org = self.org_id(), error = %e, "broker poll failed for raw_file_received");
                return Ok(());
            }
        };

        let event: RawFileReceived = match serde_json::from_value(message.body.clone()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "malformed raw_file_received event, acking and dropping");
                self.broker.ack(&message).await?;
                return Ok(());
            }
        };

        let has_error = event.raw_data.mime_types.iter().any(|m| m.is_error());
        let producing_task = self.task_store.get_by_id(event.boefje_task_id).await?;

        match producing_task {
            None => {
                tracing::warn!(task_id = %event.boefje_task_id, "producing boefje task not found, skipping");
            }
            Some(task) => {
                let status = if has_error { TaskStatus::Failed } else { TaskStatus::Completed };
                self.task_store.update_status(task.id, status, now).await?;

                if !has_error {
                    self.fanout_normalizers(&event.raw_data, now).await?;
                }
            }
        }

        self.broker.ack(&message).await?;
        Ok(())
    }

    async fn fanout_normalizers(&self, raw_data: &RawData, now: DateTime<Utc>) -> Result<()> {
        for mime_type in &raw_data.mime_types {
            let normalizers: Vec<Plugin> = self
                .catalogue
                .list_normalizers_for_mime_type(self.org_id(), &mime_type.value)
                .await?
                .into_iter()
                .filter(|p| p.enabled)
                .collect();

            for normalizer in normalizers {
                let candidate = NormalizerTask {
                    normalizer_id: normalizer.id.clone(),
                    raw_data_boefje_meta_id: raw_data.boefje_meta.id.clone(),
                    organization: self.org_id().to_string(),
                };
                let hash = candidate.hash();
                if self.queue.is_item_on_queue(&self.entity.id, &hash).await? {
                    continue;
                }

                let priority = NormalizerRanker.rank(&now);
                let item = PrioritizedItem::new(&self.entity.id, priority, QueueItem::Normalizer(candidate), now);
                let task = Task::new(item.clone(), now);
                self.task_store.add(task).await?;
                self.queue.push(item, &self.queue_config).await?;
            }
        }
        Ok(())
    }

    /// R2: pulls one `normalizer_meta_received` message and marks the
    /// corresponding normalizer task completed. A missing task is logged
    /// and ignored, not an error.
    pub async fn ingest_normalizer_completion(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.entity.is_populate_enabled() {
            return Ok(());
        }
        let subject = Message::normalizer_meta_received(self.org_id());
        let message = match self.broker.poll(&subject).await {
            Ok(Some(m)) => m,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(org = self.org_id(), error = %e, "broker poll failed for normalizer_meta_received");
                return Ok(());
            }
        };

        let event: NormalizerMetaReceived = match serde_json::from_value(message.body.clone()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "malformed normalizer_meta_received event, acking and dropping");
                self.broker.ack(&message).await?;
                return Ok(());
            }
        };

        match self.task_store.get_by_id(event.normalizer_task_id).await? {
            Some(task) => {
                self.task_store.update_status(task.id, TaskStatus::Completed, now).await?;
            }
            None => {
                tracing::warn!(task_id = %event.normalizer_task_id, "normalizer task not found, ignoring completion");
            }
        }

        self.broker.ack(&message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InMemoryBroker, InMemoryCatalogueClient};
    use crate::domain::{BoefjeMeta, MimeType, PluginKind};
    use crate::queue::InMemoryQueue;
    use crate::store::InMemoryTaskStore;
    use serde_json::json;

    fn scheduler(org_id: &str) -> (Arc<NormalizerScheduler>, Arc<InMemoryCatalogueClient>, Arc<InMemoryBroker>, Arc<InMemoryTaskStore>) {
        let org = Organisation { id: org_id.to_string(), name: org_id.to_string() };
        let catalogue = Arc::new(InMemoryCatalogueClient::default());
        let broker = Arc::new(InMemoryBroker::default());
        let queue = Arc::new(InMemoryQueue::default());
        let task_store = Arc::new(InMemoryTaskStore::default());

        let s = Arc::new(NormalizerScheduler::new(
            org,
            queue,
            task_store.clone(),
            catalogue.clone(),
            broker.clone(),
            QueueConfig::default(),
        ));
        (s, catalogue, broker, task_store)
    }

    fn normalizer(id: &str, consumes: &str) -> Plugin {
        Plugin {
            id: id.to_string(),
            kind: PluginKind::Normalizer,
            enabled: true,
            consumes: vec![consumes.to_string()],
            produces: vec![],
        }
    }

    #[tokio::test]
    async fn raw_data_completes_task_and_queues_normalizer() {
        let (scheduler, catalogue, broker, task_store) = scheduler("org-1");
        catalogue.plugins.write().insert("org-1".to_string(), vec![normalizer("n1", "text/plain")]);

        let boefje_task = Task::new(
            PrioritizedItem::new("boefje-org-1", 2, QueueItem::Boefje(crate::domain::BoefjeTask {
                boefje_id: "b1".to_string(),
                input_ooi: "ooi-A".to_string(),
                organization: "org-1".to_string(),
            }), Utc::now()),
            Utc::now(),
        );
        let task_id = boefje_task.id;
        task_store.add(boefje_task).await.unwrap();
        task_store.update_status(task_id, TaskStatus::Dispatched, Utc::now()).await.unwrap();

        broker.publish(Message {
            subject: Message::raw_file_received("org-1"),
            body: json!({
                "boefje_task_id": task_id,
                "raw_data": {
                    "boefje_meta": BoefjeMeta {
                        id: "meta-1".to_string(),
                        boefje_id: "b1".to_string(),
                        input_ooi: "ooi-A".to_string(),
                        organization: "org-1".to_string(),
                        started_at: None,
                        ended_at: Some(Utc::now()),
                    },
                    "mime_types": [MimeType { value: "text/plain".to_string() }],
                }
            }),
        });

        scheduler.ingest_raw_data(Utc::now()).await.unwrap();

        let task = task_store.get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(scheduler.queue.qsize(&scheduler.entity.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn error_mime_fails_task_without_normalizer() {
        let (scheduler, catalogue, broker, task_store) = scheduler("org-1");
        catalogue.plugins.write().insert("org-1".to_string(), vec![normalizer("n1", "error/timeout")]);

        let boefje_task = Task::new(
            PrioritizedItem::new("boefje-org-1", 2, QueueItem::Boefje(crate::domain::BoefjeTask {
                boefje_id: "b1".to_string(),
                input_ooi: "ooi-A".to_string(),
                organization: "org-1".to_string(),
            }), Utc::now()),
            Utc::now(),
        );
        let task_id = boefje_task.id;
        task_store.add(boefje_task).await.unwrap();

        broker.publish(Message {
            subject: Message::raw_file_received("org-1"),
            body: json!({
                "boefje_task_id": task_id,
                "raw_data": {
                    "boefje_meta": BoefjeMeta {
                        id: "meta-1".to_string(),
                        boefje_id: "b1".to_string(),
                        input_ooi: "ooi-A".to_string(),
                        organization: "org-1".to_string(),
                        started_at: None,
                        ended_at: Some(Utc::now()),
                    },
                    "mime_types": [MimeType { value: "error/timeout".to_string() }],
                }
            }),
        });

        scheduler.ingest_raw_data(Utc::now()).await.unwrap();

        let task = task_store.get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(scheduler.queue.qsize(&scheduler.entity.id).await.unwrap(), 0);
    }
}
