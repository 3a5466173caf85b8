//! Prometheus metrics: queue depth, push/pop counters, populate tick duration.

use metrics::{counter, describe_counter, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Deserialize;
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Installs the Prometheus recorder and registers metric descriptions.
/// Returns a handle whose `render()` backs the `/metrics` endpoint.
pub fn init_metrics(config: &MetricsConfig) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = HANDLE.set(handle.clone());

    describe_counter!("scheduler_queue_push_total", "Accepted priority queue pushes");
    describe_counter!("scheduler_queue_push_rejected_total", "Rejected priority queue pushes");
    describe_counter!("scheduler_queue_pop_total", "Priority queue pops");
    describe_histogram!("scheduler_populate_tick_seconds", "Duration of one populate loop iteration");
    describe_counter!("scheduler_candidate_dropped_total", "Boefje candidates dropped by admissibility checks");

    Ok(Some(handle))
}

pub fn record_push(scheduler_id: &str, accepted: bool) {
    if accepted {
        counter!("scheduler_queue_push_total", "scheduler_id" => scheduler_id.to_string()).increment(1);
    } else {
        counter!("scheduler_queue_push_rejected_total", "scheduler_id" => scheduler_id.to_string()).increment(1);
    }
}

pub fn record_pop(scheduler_id: &str) {
    counter!("scheduler_queue_pop_total", "scheduler_id" => scheduler_id.to_string()).increment(1);
}

pub fn record_populate_tick(scheduler_id: &str, seconds: f64) {
    histogram!("scheduler_populate_tick_seconds", "scheduler_id" => scheduler_id.to_string()).record(seconds);
}

pub fn record_candidate_dropped(scheduler_id: &str, reason: &str) {
    counter!(
        "scheduler_candidate_dropped_total",
        "scheduler_id" => scheduler_id.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn set_queue_size(scheduler_id: &str, size: u64) {
    gauge!("scheduler_queue_size", "scheduler_id" => scheduler_id.to_string()).set(size as f64);
}

pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}
