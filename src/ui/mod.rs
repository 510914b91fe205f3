//! Presentation boundary
//!
//! The controller talks to whatever draws the window through
//! [`StatusView`]. All of its methods are called on the UI thread only.

mod console;

pub use console::ConsoleView;

use std::fmt;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::updater::UpdateOutcome;

/// How an indication should be coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Green
    Ok,
    /// Orange
    Warning,
    /// Red
    Error,
}

/// A status line shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indication {
    Stopped,
    Running,
    Unconfigured,
    Updated,
    HttpError(u16),
    Failed(String),
    InvalidInterval,
    Saved,
    SaveFailed(String),
}

impl Indication {
    /// Colour of the status line
    pub fn severity(&self) -> Severity {
        match self {
            Indication::Running | Indication::Updated | Indication::Saved => Severity::Ok,
            Indication::Unconfigured | Indication::InvalidInterval => Severity::Warning,
            Indication::Stopped
            | Indication::HttpError(_)
            | Indication::Failed(_)
            | Indication::SaveFailed(_) => Severity::Error,
        }
    }
}

impl From<&UpdateOutcome> for Indication {
    fn from(outcome: &UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Unconfigured => Indication::Unconfigured,
            UpdateOutcome::Success => Indication::Updated,
            UpdateOutcome::HttpError(code) => Indication::HttpError(*code),
            UpdateOutcome::TransportError(message) => Indication::Failed(message.clone()),
        }
    }
}

impl fmt::Display for Indication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indication::Stopped => write!(f, "Status: Stopped"),
            Indication::Running => write!(f, "Status: Running"),
            Indication::Unconfigured => write!(f, "DDNS URL not configured"),
            Indication::Updated => write!(f, "Update successful"),
            Indication::HttpError(code) => write!(f, "HTTP {}", code),
            Indication::Failed(message) => write!(f, "Error: {}", message),
            Indication::InvalidInterval => write!(f, "Invalid interval"),
            Indication::Saved => write!(f, "Configuration saved"),
            Indication::SaveFailed(message) => {
                write!(f, "Could not save configuration: {}", message)
            }
        }
    }
}

/// Formats the "last run" line
pub fn format_last_run(at: Option<DateTime<Local>>) -> String {
    match at {
        Some(at) => format!("Last run: {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => "Last run: --".to_string(),
    }
}

/// Contents of the two entry fields, exactly as typed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryFields {
    pub url: String,
    pub interval: String,
}

impl EntryFields {
    /// Fields pre-filled from a stored record
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.url.clone(),
            interval: config.interval_minutes.to_string(),
        }
    }

    /// The config a running worker should use
    ///
    /// The URL is taken as typed, the interval only once it is saved.
    pub fn to_config(&self, saved: &Config) -> Config {
        Config::new(&self.url, saved.interval_minutes)
    }
}

/// Something that can display the agent's state
pub trait StatusView {
    /// Replaces the status line
    fn show_status(&mut self, indication: &Indication);

    /// Updates the "last run" timestamp
    fn show_last_run(&mut self, at: DateTime<Local>);

    /// Shows the entry fields
    fn show_fields(&mut self, fields: &EntryFields);

    /// Shows or hides the main window
    fn set_visible(&mut self, visible: bool);

    /// Shows free-form text such as help
    fn show_notice(&mut self, text: &str);
}
