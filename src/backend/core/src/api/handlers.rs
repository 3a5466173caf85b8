use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{PrioritizedItem, QueueItem};
use crate::error::{Result, SchedulerError};
use crate::health::HealthReport;

use super::AppState;

pub async fn root() -> StatusCode {
    StatusCode::OK
}

pub async fn health() -> Json<HealthReport> {
    Json(HealthReport::ok())
}

#[derive(Serialize)]
pub struct SchedulerSummary {
    pub id: String,
    pub organisation_id: String,
    pub populate_enabled: bool,
}

fn scheduler_not_found(id: &str) -> SchedulerError {
    SchedulerError::NotFound(format!("scheduler {id}"))
}

pub async fn list_schedulers(State(state): State<AppState>) -> Json<Vec<SchedulerSummary>> {
    let schedulers = state.schedulers.read();
    let mut summaries: Vec<SchedulerSummary> = Vec::new();
    for pair in schedulers.values() {
        summaries.push(SchedulerSummary {
            id: pair.boefje.entity.id.clone(),
            organisation_id: pair.boefje.entity.organisation.id.clone(),
            populate_enabled: pair.boefje.entity.is_populate_enabled(),
        });
        summaries.push(SchedulerSummary {
            id: pair.normalizer.entity.id.clone(),
            organisation_id: pair.normalizer.entity.organisation.id.clone(),
            populate_enabled: pair.normalizer.entity.is_populate_enabled(),
        });
    }
    Json(summaries)
}

fn find_entity<'a>(
    pair: &'a super::SchedulerPair,
    scheduler_id: &str,
) -> Option<&'a crate::scheduler::SchedulerEntity> {
    if pair.boefje.entity.id == scheduler_id {
        Some(&pair.boefje.entity)
    } else if pair.normalizer.entity.id == scheduler_id {
        Some(&pair.normalizer.entity)
    } else {
        None
    }
}

pub async fn get_scheduler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SchedulerSummary>> {
    let schedulers = state.schedulers.read();
    for pair in schedulers.values() {
        if let Some(entity) = find_entity(pair, &id) {
            return Ok(Json(SchedulerSummary {
                id: entity.id.clone(),
                organisation_id: entity.organisation.id.clone(),
                populate_enabled: entity.is_populate_enabled(),
            }));
        }
    }
    Err(scheduler_not_found(&id))
}

#[derive(Deserialize)]
pub struct PatchSchedulerRequest {
    pub populate_enabled: Option<bool>,
}

pub async fn patch_scheduler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PatchSchedulerRequest>,
) -> Result<Json<SchedulerSummary>> {
    let schedulers = state.schedulers.read();
    for pair in schedulers.values() {
        if let Some(entity) = find_entity(pair, &id) {
            if let Some(enabled) = body.populate_enabled {
                entity.set_populate_enabled(enabled);
            }
            return Ok(Json(SchedulerSummary {
                id: entity.id.clone(),
                organisation_id: entity.organisation.id.clone(),
                populate_enabled: entity.is_populate_enabled(),
            }));
        }
    }
    Err(scheduler_not_found(&id))
}

#[derive(Serialize)]
pub struct QueueSummary {
    pub id: String,
    pub size: usize,
    pub maxsize: usize,
}

pub async fn list_queues(State(state): State<AppState>) -> Result<Json<Vec<QueueSummary>>> {
    let ids: Vec<(String, crate::queue::QueueConfig)> = {
        let schedulers = state.schedulers.read();
        schedulers
            .values()
            .flat_map(|pair| {
                [
                    (pair.boefje.entity.id.clone(), pair.queue_config),
                    (pair.normalizer.entity.id.clone(), pair.queue_config),
                ]
            })
            .collect()
    };

    let mut summaries = Vec::with_capacity(ids.len());
    for (id, config) in ids {
        let size = state.queue.qsize(&id).await?;
        summaries.push(QueueSummary { id, size, maxsize: config.maxsize });
    }
    Ok(Json(summaries))
}

pub async fn get_queue(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<QueueSummary>> {
    let config = {
        let schedulers = state.schedulers.read();
        schedulers
            .values()
            .find_map(|pair| find_entity(pair, &id).map(|_| pair.queue_config))
    };
    let Some(config) = config else {
        return Err(SchedulerError::NotFound(format!("queue {id}")));
    };
    let size = state.queue.qsize(&id).await?;
    Ok(Json(QueueSummary { id, size, maxsize: config.maxsize }))
}

pub async fn pop_queue(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<PrioritizedItem>> {
    let item = state.queue.pop(&id).await?;
    Ok(Json(item))
}

#[derive(Deserialize)]
pub struct PushRequest {
    pub priority: i64,
    pub data: QueueItem,
}

pub async fn push_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PushRequest>,
) -> Result<StatusCode> {
    let config = {
        let schedulers = state.schedulers.read();
        schedulers
            .values()
            .find_map(|pair| find_entity(pair, &id).map(|_| pair.queue_config))
    };
    let Some(config) = config else {
        return Err(SchedulerError::NotFound(format!("queue {id}")));
    };

    let item = PrioritizedItem::new(id, body.priority, body.data, Utc::now());
    state.queue.push(item, &config).await?;
    Ok(StatusCode::NO_CONTENT)
}
