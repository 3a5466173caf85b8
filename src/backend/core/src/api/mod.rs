//! The control API: `Router<AppState>` composed the way the teacher's
//! `api::build_router` is, trimmed to the endpoints named in the external
//! interfaces — schedulers, queues, health. Authentication, versioning and
//! the other concerns the teacher's middleware stack serves are out of
//! scope here and dropped along with their layers.

mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::queue::{Queue, QueueConfig};
use crate::scheduler::boefje::BoefjeScheduler;
use crate::scheduler::normalizer::NormalizerScheduler;
use crate::store::TaskStore;

/// One organisation's live scheduler pair, as registered by the supervisor.
pub struct SchedulerPair {
    pub boefje: Arc<BoefjeScheduler>,
    pub normalizer: Arc<NormalizerScheduler>,
    pub queue_config: QueueConfig,
}

/// Shared state handed to every handler: the process-wide queue and task
/// store plus a lookup of scheduler id -> pair, refreshed by the
/// supervisor's reconcile loop.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn Queue>,
    pub task_store: Arc<dyn TaskStore>,
    pub schedulers: Arc<parking_lot::RwLock<HashMap<String, Arc<SchedulerPair>>>>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/schedulers", get(handlers::list_schedulers))
        .route("/schedulers/:id", get(handlers::get_scheduler))
        .route("/schedulers/:id", patch(handlers::patch_scheduler))
        .route("/queues", get(handlers::list_queues))
        .route("/queues/:id", get(handlers::get_queue))
        .route("/queues/:id/pop", get(handlers::pop_queue))
        .route("/queues/:id/push", post(handlers::push_queue))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
