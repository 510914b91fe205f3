//! Scriptable updater for tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::base::{StatusEvent, UpdateOutcome, Updater};
use crate::config::Config;

/// Updater that records every attempt and answers with a fixed outcome
pub(crate) struct MockUpdater {
    attempts: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    outcome: UpdateOutcome,
    delay: Duration,
    seen: Mutex<Vec<Config>>,
}

impl MockUpdater {
    pub(crate) fn new(outcome: UpdateOutcome) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            max_in_flight: AtomicU32::new(0),
            outcome,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Makes every attempt take `delay` before completing
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Highest number of attempts that were running at the same time
    pub(crate) fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Configs passed to each attempt, in order
    pub(crate) fn seen(&self) -> Vec<Config> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Updater for MockUpdater {
    async fn attempt(&self, config: &Config) -> StatusEvent {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.seen.lock().unwrap().push(config.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if config.is_configured() {
            StatusEvent::now(self.outcome.clone())
        } else {
            StatusEvent::now(UpdateOutcome::Unconfigured)
        }
    }
}
