//! Configuration managers
//!
//! A manager owns one source and drives configurations from it into a target, either once
//! at startup or periodically from a background task.

mod immutable;
mod polling;

pub use self::immutable::ImmutableConfigManager;
pub use self::polling::PollingConfigManager;

use std::any::Any;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Created, not started
    Idle,
    /// Background polling task running
    Running,
    /// Stop requested, waiting for the polling task to exit
    Stopping,
    /// Polling task stopped
    Stopped,
    /// Single-shot configuration applied
    Applied,
    /// Single-shot configuration failed; shutdown was requested
    Failed,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Applied => write!(f, "applied"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Text of a caught panic payload
fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// How a source is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Load once at startup
    Once,
    /// Poll at a fixed interval
    Every(Duration),
}

/// Configuration manager
#[derive(Debug)]
pub enum ConfigManager {
    /// Loads once, for sources that cannot change
    Immutable(ImmutableConfigManager),
    /// Polls in the background
    Polling(PollingConfigManager),
}

impl ConfigManager {
    /// Start delivering configurations
    pub async fn start(&mut self) {
        match self {
            Self::Immutable(manager) => manager.start().await,
            Self::Polling(manager) => manager.start(),
        }
    }

    /// Stop delivering configurations
    ///
    /// Waits for a running poll to finish. Safe to call more than once.
    pub async fn stop(&mut self) {
        match self {
            Self::Immutable(manager) => manager.stop(),
            Self::Polling(manager) => manager.stop().await,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ManagerState {
        match self {
            Self::Immutable(manager) => manager.state(),
            Self::Polling(manager) => manager.state(),
        }
    }

    /// Poll interval, if polling
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Immutable(_) => None,
            Self::Polling(manager) => Some(manager.interval()),
        }
    }

    /// Whether this manager loads only once
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Immutable(_))
    }
}

impl From<ImmutableConfigManager> for ConfigManager {
    fn from(manager: ImmutableConfigManager) -> Self {
        Self::Immutable(manager)
    }
}

impl From<PollingConfigManager> for ConfigManager {
    fn from(manager: PollingConfigManager) -> Self {
        Self::Polling(manager)
    }
}
