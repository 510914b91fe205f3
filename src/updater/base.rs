//! Base types and traits for update attempts
//!
//! An attempt never fails in the `Result` sense: every outcome, including
//! network faults, is folded into an [`UpdateOutcome`] so nothing is ever
//! thrown across the worker/UI boundary.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Result of one update attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// No update URL configured, no request was made
    Unconfigured,
    /// The endpoint answered 200
    Success,
    /// The endpoint answered with any other status code
    HttpError(u16),
    /// The request never produced a response (timeout, DNS, refused, TLS...)
    TransportError(String),
}

impl UpdateOutcome {
    /// Returns true if the record was updated
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success)
    }

    /// Returns true for outcomes that count as a failed attempt
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::HttpError(_) | UpdateOutcome::TransportError(_)
        )
    }

    /// Whether this outcome should refresh the "last run" display
    ///
    /// Every real attempt does, success or failure; an unconfigured tick
    /// did not run anything.
    pub fn counts_as_run(&self) -> bool {
        !matches!(self, UpdateOutcome::Unconfigured)
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Unconfigured => write!(f, "unconfigured"),
            UpdateOutcome::Success => write!(f, "success"),
            UpdateOutcome::HttpError(code) => write!(f, "HTTP {}", code),
            UpdateOutcome::TransportError(message) => write!(f, "transport error: {}", message),
        }
    }
}

/// Reported outcome of one attempt, stamped at completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub outcome: UpdateOutcome,
    pub timestamp: DateTime<Local>,
}

impl StatusEvent {
    /// Creates an event stamped with the current local time
    pub fn now(outcome: UpdateOutcome) -> Self {
        Self {
            outcome,
            timestamp: Local::now(),
        }
    }
}

/// Something that can perform a single update attempt
#[async_trait]
pub trait Updater: Send + Sync {
    /// Performs exactly one attempt for `config` and reports how it went
    async fn attempt(&self, config: &Config) -> StatusEvent;
}
