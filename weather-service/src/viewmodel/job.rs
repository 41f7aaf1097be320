use std::future::Future;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

/// Tracks the running job of one operation kind. Launching a new job
/// aborts the previous one if it is still running; the abort is not awaited.
pub struct JobSlot {
    name: &'static str,
    handle: Mutex<Option<AbortHandle>>,
}

impl JobSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    /// Spawns `job` and registers it while holding the slot, so the most
    /// recently spawned job is always the one that survives.
    pub async fn launch<F>(&self, job: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let mut slot = self.handle.lock().await;
        let handle = tokio::spawn(job);
        if let Some(previous) = slot.replace(handle.abort_handle())
            && !previous.is_finished()
        {
            previous.abort();
            debug!(job = self.name, "Cancelled previous job");
        }
        handle
    }

    pub async fn cancel(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }
}
