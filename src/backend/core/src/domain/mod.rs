//! Core domain types: organisations, OOIs, plugins, tasks and the
//! prioritized-item envelope that the queue stores.

mod hash;
mod ooi;
mod organisation;
mod plugin;
mod prioritized_item;
mod task;
mod tasks;

pub use hash::stable_hash;
pub use ooi::Ooi;
pub use organisation::Organisation;
pub use plugin::{Plugin, PluginKind};
pub use prioritized_item::PrioritizedItem;
pub use task::{Task, TaskStatus};
pub use tasks::{BoefjeMeta, BoefjeTask, MimeType, NormalizerTask, QueueItem, RawData};
