//! # Mula Scheduler
//!
//! A multi-tenant security-scan task scheduler: per-organisation boefje and
//! normalizer schedulers feed a priority queue of scan work, fronted by a
//! small control API for inspecting and steering queues at runtime.
//!
//! ## Architecture
//!
//! - **domain**: organisations, OOIs, plugins, tasks, the queue's item envelope
//! - **ranker**: pure priority functions consumed by the schedulers
//! - **queue** / **store**: the bounded de-duplicated priority queue and its task history, in-memory or Postgres-backed
//! - **clients**: typed collaborators — catalogue, inventory, blob store, message broker
//! - **scheduler**: the boefje and normalizer populate/ingest loops and their shared primitives
//! - **api**: the control API (schedulers, queues, health)
//! - **telemetry**: structured logging and process metrics
//! - **config**: environment-driven configuration

pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod health;
pub mod queue;
pub mod ranker;
pub mod scheduler;
pub mod store;
pub mod telemetry;

pub use error::{Result, SchedulerError};

/// Re-export of the types most call sites need.
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::domain::{
        BoefjeMeta, BoefjeTask, MimeType, NormalizerTask, Ooi, Organisation, Plugin, PluginKind,
        PrioritizedItem, QueueItem, RawData, Task, TaskStatus,
    };
    pub use crate::error::{Result, SchedulerError};
    pub use crate::queue::{Queue, QueueConfig};
    pub use crate::scheduler::boefje::BoefjeScheduler;
    pub use crate::scheduler::normalizer::NormalizerScheduler;
    pub use crate::scheduler::SchedulerEntity;
    pub use crate::store::TaskStore;
}
