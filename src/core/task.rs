/*!
 * Background Task Handle
 *
 * Owns a spawned tokio task and implements the graceful-with-fallback
 * shutdown pattern:
 *
 * 1. **Preferred path:** `shutdown().await` signals the task through a
 *    oneshot channel and awaits its `JoinHandle`. Consumes self so a task
 *    cannot be shut down twice.
 * 2. **Fallback path:** `Drop` aborts the task if `shutdown()` was never
 *    called, logging a warning.
 *
 * Task bodies receive a [`ShutdownSignal`] and are expected to `select!` on
 * it alongside their own timers.
 */

use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Resolves when the owning [`BackgroundTask`] requests shutdown
pub type ShutdownSignal = oneshot::Receiver<()>;

/// Handle to a named background task
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    /// Spawn `body` on the current tokio runtime
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(ShutdownSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(body(shutdown_rx));
        debug!(task = name, "Background task spawned");

        Self {
            name,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task body has returned
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Shutdown the task gracefully and wait for it to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(task = self.name, error = %e, "Background task shutdown error");
            } else {
                debug!(task = self.name, "Background task shutdown complete");
            }
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                warn!(
                    task = self.name,
                    "Background task dropped without calling shutdown() - aborting"
                );
            }
            handle.abort();
        }
    }
}
