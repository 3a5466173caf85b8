//! Scheduler entities and the shared interval-loop / back-pressure
//! primitives both concrete schedulers (`boefje`, `normalizer`) build on.

pub mod boefje;
pub mod normalizer;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::Organisation;
use crate::error::Result;
use crate::queue::Queue;

/// The abstract scheduler entity named in the component design: an id, its
/// tenant, and the one piece of externally mutable state the control API
/// exposes (`populate_enabled`).
#[derive(Debug, Clone)]
pub struct SchedulerEntity {
    pub id: String,
    pub organisation: Organisation,
    populate_enabled: Arc<AtomicBool>,
}

impl SchedulerEntity {
    pub fn new(id: impl Into<String>, organisation: Organisation) -> Self {
        Self {
            id: id.into(),
            organisation,
            populate_enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_populate_enabled(&self) -> bool {
        self.populate_enabled.load(Ordering::SeqCst)
    }

    pub fn set_populate_enabled(&self, enabled: bool) {
        self.populate_enabled.store(enabled, Ordering::SeqCst);
    }
}

/// Handle to a running [`spawn_interval_worker`] task: carries the shutdown
/// signal, the last error observed by an iteration (surfaced through health
/// endpoints), and the join handle used to wait for exit on shutdown.
pub struct IntervalWorkerHandle {
    shutdown: watch::Sender<bool>,
    last_error: Arc<Mutex<Option<String>>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl IntervalWorkerHandle {
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Sets the shared stop flag and waits up to `timeout` for the worker to
    /// exit its current iteration and return. A worker that doesn't exit in
    /// time is abandoned, per the bounded-join requirement.
    pub async fn stop_and_join(&self, timeout: Duration) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.lock().take() {
            if tokio::time::timeout(timeout, join).await.is_err() {
                tracing::warn!("interval worker did not shut down within {timeout:?}, abandoning");
            }
        }
    }
}

/// Runs `f` every `interval` until the stop flag is set, grounded on the
/// teacher's `jobs::worker::JobWorker`/`jobs::scheduler::JobScheduler`
/// watch-channel shutdown pattern. Errors from `f` are logged and recorded
/// for inspection rather than propagated — populate loops never abort the
/// process on a single bad iteration.
pub fn spawn_interval_worker<F, Fut>(name: impl Into<String>, interval: Duration, mut f: F) -> IntervalWorkerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send,
{
    let name = name.into();
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let last_error = Arc::new(Mutex::new(None));
    let last_error_task = last_error.clone();

    let join = tokio::spawn(async move {
        tracing::info!(worker = %name, "interval worker started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = async {
                    if let Err(e) = f().await {
                        tracing::warn!(worker = %name, error = %e, "interval worker iteration failed");
                        *last_error_task.lock() = Some(e.to_string());
                    }
                    tokio::time::sleep(interval).await;
                } => {}
            }
        }
        tracing::info!(worker = %name, "interval worker stopped");
    });

    IntervalWorkerHandle {
        shutdown: shutdown_tx,
        last_error,
        join: Mutex::new(Some(join)),
    }
}

/// Shared back-pressure primitive named in the Boefje Scheduler supplement:
/// blocks until the queue has room for `incoming` more items, or returns
/// immediately for an unbounded queue. Used by both populate paths instead
/// of shedding work when the queue is near capacity.
pub async fn wait_for_space(
    queue: &dyn Queue,
    scheduler_id: &str,
    maxsize: usize,
    incoming: usize,
    backoff: Duration,
) -> Result<()> {
    if maxsize == 0 {
        return Ok(());
    }
    loop {
        let qsize = queue.qsize(scheduler_id).await?;
        if incoming <= maxsize.saturating_sub(qsize) {
            return Ok(());
        }
        tokio::time::sleep(backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interval_worker_stops_promptly() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls2 = calls.clone();
        let handle = spawn_interval_worker("test", Duration::from_millis(5), move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.stop_and_join(Duration::from_secs(1)).await;
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn interval_worker_records_last_error() {
        let handle = spawn_interval_worker("test", Duration::from_millis(5), || async {
            Err(crate::error::SchedulerError::QueueEmpty)
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop_and_join(Duration::from_secs(1)).await;
        assert!(handle.last_error().is_some());
    }
}
