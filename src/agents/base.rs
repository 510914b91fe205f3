//! Base agent types
//!
//! Defines the run state shared by the agent and the types of the
//! callbacks it is started with.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::updater::StatusEvent;

/// Run state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentState {
    /// No worker is polling
    #[default]
    Stopped,
    /// A worker is polling
    Running,
}

impl AgentState {
    /// Returns true if the agent is running
    pub fn is_running(&self) -> bool {
        matches!(self, AgentState::Running)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Stopped => write!(f, "stopped"),
            AgentState::Running => write!(f, "running"),
        }
    }
}

/// Supplies the config a worker should use, read fresh at every cycle
pub type ConfigProvider = Arc<dyn Fn() -> Config + Send + Sync>;

/// Receives the event of every attempt, called from the worker
///
/// Implementations must hand the event off to the UI thread rather than
/// touching display state directly.
pub type StatusCallback = Arc<dyn Fn(StatusEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_state_default_is_stopped() {
        assert_eq!(AgentState::default(), AgentState::Stopped);
    }

    #[test]
    fn test_agent_state_is_running() {
        assert!(AgentState::Running.is_running());
        assert!(!AgentState::Stopped.is_running());
    }

    #[test]
    fn test_agent_state_display() {
        assert_eq!(AgentState::Running.to_string(), "running");
        assert_eq!(AgentState::Stopped.to_string(), "stopped");
    }
}
