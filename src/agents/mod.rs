//! Agent module - The background update loop
//!
//! Provides the agent that periodically calls the DDNS update URL and
//! reports the outcome of every attempt.

mod base;
mod update_agent;

pub use base::{AgentState, ConfigProvider, StatusCallback};
pub use update_agent::UpdateAgent;
