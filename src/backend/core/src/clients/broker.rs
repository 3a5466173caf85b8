use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

use crate::error::Result;

/// A single event delivered on a per-organisation subject. The scheduler
/// treats the body as an opaque JSON payload and only inspects `subject`
/// to route it to the right ingest routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    pub body: Value,
}

impl Message {
    pub fn scan_profile_mutations(org_id: &str) -> String {
        format!("{org_id}__scan_profile_mutations")
    }

    pub fn raw_file_received(org_id: &str) -> String {
        format!("{org_id}__raw_file_received")
    }

    pub fn normalizer_meta_received(org_id: &str) -> String {
        format!("{org_id}__normalizer_meta_received")
    }
}

/// The message broker collaborator named in the purpose and scope: an
/// external AMQP exchange this scheduler consumes from but never owns. Only
/// the shape the scheduler needs is modeled here — a non-blocking poll per
/// subject and an ack once the event has been durably handled.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Returns the oldest unacked message for `subject`, if any, without
    /// blocking. Callers must `ack` it once handling is durable.
    async fn poll(&self, subject: &str) -> Result<Option<Message>>;

    async fn ack(&self, message: &Message) -> Result<()>;
}

/// In-process double: a FIFO queue per subject, for tests and for running
/// without a broker deployed. `publish` is test-only surface, not part of
/// the trait other collaborators publish through an external exchange.
#[derive(Default)]
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, VecDeque<Message>>>,
}

impl InMemoryBroker {
    pub fn publish(&self, message: Message) {
        self.queues
            .lock()
            .entry(message.subject.clone())
            .or_default()
            .push_back(message);
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn poll(&self, subject: &str) -> Result<Option<Message>> {
        Ok(self
            .queues
            .lock()
            .get(subject)
            .and_then(|q| q.front().cloned()))
    }

    async fn ack(&self, message: &Message) -> Result<()> {
        if let Some(q) = self.queues.lock().get_mut(&message.subject) {
            if q.front().map(|m| m.body == message.body) == Some(true) {
                q.pop_front();
            }
        }
        Ok(())
    }
}
