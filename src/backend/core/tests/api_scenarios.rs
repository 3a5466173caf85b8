//! End-to-end control-API scenarios driven through the HTTP layer, covering
//! the priority-update and queue-full invariants that the in-memory queue's
//! own unit tests exercise directly against the `Queue` trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use mula_core::api::{build_router, AppState, SchedulerPair};
use mula_core::clients::{InMemoryBlobStoreClient, InMemoryBroker, InMemoryCatalogueClient, InMemoryInventoryClient, PluginCache};
use mula_core::domain::Organisation;
use mula_core::queue::{InMemoryQueue, Queue, QueueConfig};
use mula_core::scheduler::boefje::BoefjeScheduler;
use mula_core::scheduler::normalizer::NormalizerScheduler;
use mula_core::store::InMemoryTaskStore;

fn build_state(queue_config: QueueConfig) -> (AppState, Arc<dyn Queue>, String) {
    let org = Organisation { id: "test-org".to_string(), name: "test-org".to_string() };
    let queue: Arc<dyn Queue> = Arc::new(InMemoryQueue::default());
    let task_store: Arc<dyn mula_core::store::TaskStore> = Arc::new(InMemoryTaskStore::default());
    let catalogue = Arc::new(InMemoryCatalogueClient::default());
    let inventory = Arc::new(InMemoryInventoryClient::default());
    let blob_store = Arc::new(InMemoryBlobStoreClient::default());
    let broker = Arc::new(InMemoryBroker::default());
    let plugin_cache = Arc::new(PluginCache::new(Duration::from_secs(60)));

    let boefje = Arc::new(BoefjeScheduler::new(
        org.clone(),
        queue.clone(),
        task_store.clone(),
        catalogue.clone(),
        inventory,
        blob_store,
        broker.clone(),
        plugin_cache,
        queue_config,
        60,
        queue_config.maxsize,
        Duration::from_millis(1),
    ));
    let normalizer = Arc::new(NormalizerScheduler::new(org, queue.clone(), task_store, catalogue, broker, queue_config));
    let id = boefje.entity.id.clone();

    let mut schedulers = HashMap::new();
    schedulers.insert(
        id.clone(),
        Arc::new(SchedulerPair { boefje, normalizer, queue_config }),
    );

    let state = AppState { queue: queue.clone(), task_store, schedulers: Arc::new(parking_lot::RwLock::new(schedulers)) };
    (state, queue, id)
}

fn push_body(priority: i64, boefje_id: &str) -> Body {
    Body::from(
        serde_json::json!({
            "priority": priority,
            "data": {
                "kind": "Boefje",
                "boefje_id": boefje_id,
                "input_ooi": "ooi-A",
                "organization": "test-org",
            }
        })
        .to_string(),
    )
}

/// Scenario 3: push a task, then push the same hash again at a lower
/// priority; `allow_priority_updates` defaults to true so the queue should
/// hold a single item whose priority moved to the new, lower value.
#[tokio::test]
async fn priority_update_via_api_replaces_in_place() {
    let (state, queue, id) = build_state(QueueConfig::default());
    let app = build_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/queues/{id}/push"))
                .header("content-type", "application/json")
                .body(push_body(100, "b-1"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(queue.qsize(&id).await.unwrap(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/queues/{id}/push"))
                .header("content-type", "application/json")
                .body(push_body(5, "b-1"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(queue.qsize(&id).await.unwrap(), 1);

    let head = queue.peek(&id, 0).await.unwrap().expect("queue should not be empty");
    assert_eq!(head.priority, 5);
}

/// Scenario 4: `pq_maxsize=1`. Pushing a second, distinct item onto a full
/// queue is rejected with `QueueFull`/400 and the first item stays head.
#[tokio::test]
async fn queue_full_rejects_second_distinct_item() {
    let queue_config = QueueConfig { maxsize: 1, ..QueueConfig::default() };
    let (state, queue, id) = build_state(queue_config);
    let app = build_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/queues/{id}/push"))
                .header("content-type", "application/json")
                .body(push_body(10, "b-a"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/queues/{id}/push"))
                .header("content-type", "application/json")
                .body(push_body(20, "b-b"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(queue.qsize(&id).await.unwrap(), 1);
    let head = queue.peek(&id, 0).await.unwrap().expect("queue should not be empty");
    match head.data {
        mula_core::domain::QueueItem::Boefje(task) => assert_eq!(task.boefje_id, "b-a"),
        _ => panic!("expected boefje task"),
    }
}
