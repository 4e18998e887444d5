use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::ProgressReconciler;

/// Owns a reconciler and drives its poll loop on a fixed cadence.
///
/// Dropping the handle aborts the loop, so a torn-down course view cannot
/// keep writing positions or issuing completion calls in the background.
pub struct ReconcilerHandle {
    inner: Arc<Mutex<ProgressReconciler>>,
    poll_task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl ReconcilerHandle {
    pub fn new(reconciler: ProgressReconciler) -> Self {
        let interval = reconciler.config().poll_interval();
        Self {
            inner: Arc::new(Mutex::new(reconciler)),
            poll_task: None,
            interval,
        }
    }

    /// Shared access to the reconciler, for opening lessons, marking
    /// completions and reading state while the loop runs.
    pub fn reconciler(&self) -> Arc<Mutex<ProgressReconciler>> {
        self.inner.clone()
    }

    pub fn is_running(&self) -> bool {
        self.poll_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start the poll loop. A previously running loop is stopped first, so
    /// at most one loop ever ticks this reconciler.
    pub fn start(&mut self) {
        self.stop();

        let inner = self.inner.clone();
        let interval = self.interval;
        info!("Starting poll loop ({}ms cadence)", interval.as_millis());

        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                inner.lock().await.tick().await;
            }
        }));
    }

    /// Stop the poll loop. Idempotent; state in the reconciler is kept.
    pub fn stop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            debug!("Stopping poll loop");
            task.abort();
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
