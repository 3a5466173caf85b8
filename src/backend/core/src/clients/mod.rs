//! Typed clients for the external collaborators named in the purpose and
//! scope: the catalogue (plugin descriptors), the inventory (OOIs), the
//! blob store (last-run metadata) and the message broker (per-org event
//! subjects). Concrete HTTP/broker wiring lives here; the domain logic in
//! `scheduler` only depends on the traits.

mod blob_store;
mod broker;
mod catalogue;
mod inventory;
mod plugin_cache;
mod retry;

pub use blob_store::{BlobStoreClient, HttpBlobStoreClient, InMemoryBlobStoreClient};
pub use broker::{InMemoryBroker, Message, MessageBroker};
pub use catalogue::{CatalogueClient, HttpCatalogueClient, InMemoryCatalogueClient};
pub use inventory::{HttpInventoryClient, InMemoryInventoryClient, InventoryClient};
pub use plugin_cache::PluginCache;
