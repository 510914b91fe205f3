//! Update agent - Periodically calls the DDNS update URL
//!
//! Owns the `Stopped -> Running -> Stopped` lifecycle and at most one
//! polling worker. The worker runs on the agent's runtime, never on the
//! UI thread.
//!
//! Stop semantics: `stop()` cancels the inter-attempt wait immediately but
//! never interrupts an attempt in flight; that attempt (bounded by the
//! request timeout) still completes and its event is still delivered.
//! No further event follows it.
//!
//! A `start()` right after `stop()` keeps the stopped worker's handle and
//! its replacement waits on it before attempting, so two attempts never
//! overlap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::base::{AgentState, ConfigProvider, StatusCallback};
use crate::config::Config;
use crate::updater::{StatusEvent, Updater};

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

/// Agent that keeps the DDNS record fresh at a fixed interval
pub struct UpdateAgent {
    updater: Arc<dyn Updater>,
    runtime: Handle,
    worker: Mutex<Option<Worker>>,
}

impl UpdateAgent {
    /// Creates a stopped agent whose worker will run on `runtime`
    pub fn new(updater: Arc<dyn Updater>, runtime: Handle) -> Self {
        Self {
            updater,
            runtime,
            worker: Mutex::new(None),
        }
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current run state
    pub fn state(&self) -> AgentState {
        match self.lock_worker().as_ref() {
            Some(worker) if worker.is_active() => AgentState::Running,
            _ => AgentState::Stopped,
        }
    }

    /// Starts polling, unless a worker is already running
    ///
    /// The worker attempts once immediately, then waits
    /// `config_provider().interval()` before each following attempt. The
    /// interval is re-read at the start of every wait.
    ///
    /// Returns true if a new worker was launched.
    pub fn start(&self, config_provider: ConfigProvider, on_status: StatusCallback) -> bool {
        let mut worker = self.lock_worker();
        if worker.as_ref().is_some_and(Worker::is_active) {
            tracing::debug!("Update agent already running, ignoring start");
            return false;
        }

        // A stopped worker may still be finishing its last attempt
        let previous = worker
            .take()
            .map(|stopped| stopped.handle)
            .filter(|handle| !handle.is_finished());

        let cancel = CancellationToken::new();
        let handle = self.runtime.spawn(poll_loop(
            Arc::clone(&self.updater),
            config_provider,
            on_status,
            cancel.clone(),
            previous,
        ));
        *worker = Some(Worker { cancel, handle });

        tracing::info!("Update agent started");
        true
    }

    /// Stops polling
    ///
    /// Does not wait for the worker, but keeps its handle so that a later
    /// `start()` can. Returns true if it was running.
    pub fn stop(&self) -> bool {
        match self.lock_worker().as_ref() {
            Some(worker) if worker.is_active() => {
                worker.cancel.cancel();
                tracing::info!("Update agent stopped");
                true
            }
            _ => false,
        }
    }

    /// Performs a single attempt outside the polling loop
    pub async fn attempt(&self, config: &Config) -> StatusEvent {
        self.updater.attempt(config).await
    }
}

impl Drop for UpdateAgent {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    updater: Arc<dyn Updater>,
    config_provider: ConfigProvider,
    on_status: StatusCallback,
    cancel: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        tracing::debug!("Waiting for the previous worker's last attempt");
        let _ = previous.await;
    }

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let event = updater.attempt(&config_provider()).await;
        if event.outcome.is_failure() {
            tracing::debug!("Attempt failed ({}), keeping the schedule", event.outcome);
        } else {
            tracing::debug!("Attempt finished: {}", event.outcome);
        }
        on_status(event);

        let wait = config_provider().interval();
        tracing::debug!("Next update in {} min", wait.as_secs() / 60);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    tracing::debug!("Update worker exited");
}
