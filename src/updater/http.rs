//! HTTP updater implementation
//!
//! Calls the configured DDNS update URL with a plain `GET`. The provider
//! does the actual record update server-side; the status code is the only
//! thing we look at.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::base::{StatusEvent, UpdateOutcome, Updater};
use crate::config::Config;
use crate::security::Sanitizer;

/// Fixed per-request timeout, the only cancellation an in-flight call has
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Updater that issues one `GET <url>` per attempt
pub struct HttpUpdater {
    client: Client,
    timeout: Duration,
}

impl HttpUpdater {
    /// Creates an updater with the standard 15 second timeout
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Creates an updater with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ddns-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Timeout applied to every request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Updater for HttpUpdater {
    async fn attempt(&self, config: &Config) -> StatusEvent {
        let url = config.url.trim();
        if url.is_empty() {
            tracing::debug!("Skipping update, no URL configured");
            return StatusEvent::now(UpdateOutcome::Unconfigured);
        }

        tracing::debug!("Calling update URL {}", Sanitizer::sanitize_url(url));

        let outcome = match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => UpdateOutcome::Success,
            Ok(response) => UpdateOutcome::HttpError(response.status().as_u16()),
            Err(e) => UpdateOutcome::TransportError(describe_error(&e, url)),
        };

        if outcome.is_success() {
            tracing::info!("DDNS update succeeded");
        } else {
            tracing::warn!("DDNS update failed: {}", outcome);
        }

        StatusEvent::now(outcome)
    }
}

/// Builds a short, URL-free description of a transport failure
fn describe_error(error: &reqwest::Error, url: &str) -> String {
    if error.is_timeout() {
        return "request timed out".to_string();
    }

    let kind = if error.is_builder() {
        "invalid URL"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_redirect() {
        "too many redirects"
    } else if error.is_body() || error.is_decode() {
        "bad response"
    } else {
        "request failed"
    };

    // The innermost source names the actual cause (refused, DNS, TLS...)
    let mut root = error.source();
    while let Some(next) = root.and_then(|e| e.source()) {
        root = Some(next);
    }

    match root {
        Some(cause) => format!("{}: {}", kind, Sanitizer::scrub(&cause.to_string(), url)),
        None => kind.to_string(),
    }
}
