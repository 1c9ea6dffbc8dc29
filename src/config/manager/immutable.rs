//! Single-shot configuration manager

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{error, info, warn};

use super::{panic_message, ManagerState};
use crate::common::ConfigureError;
use crate::config::source::ConfigSource;
use crate::config::target::ConfigTarget;

/// Loads a configuration once and requests shutdown if that fails
///
/// Meant for sources that cannot change while the process runs, such as mounted secrets.
/// Everything happens on the caller's task.
pub struct ImmutableConfigManager {
    source: Box<dyn ConfigSource>,
    target: Arc<dyn ConfigTarget>,
    state: ManagerState,
}

impl ImmutableConfigManager {
    /// Create a new manager
    pub fn new(source: Box<dyn ConfigSource>, target: Arc<dyn ConfigTarget>) -> Self {
        Self {
            source,
            target,
            state: ManagerState::Idle,
        }
    }

    /// Load and apply the configuration
    pub async fn start(&mut self) {
        if self.state != ManagerState::Idle {
            warn!("Configuration manager already started ({})", self.state);
            return;
        }

        let source = &mut self.source;
        let target = &self.target;
        let outcome = AssertUnwindSafe(async move {
            let config = source.reload().await?;
            target
                .apply(config)
                .await
                .map_err(|e| ConfigureError::Rejected(e.to_string()))
        })
        .catch_unwind()
        .await;

        let result = outcome.unwrap_or_else(|panic| {
            Err(ConfigureError::Other(format!(
                "configuration load panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

        match result {
            Ok(()) => {
                info!("Configuration applied from {} source", self.source.source_type());
                self.state = ManagerState::Applied;
            }
            Err(e) => {
                error!("Unable to apply configuration, requesting shutdown: {}", e);
                self.state = ManagerState::Failed;
                self.target.shutdown();
            }
        }
    }

    /// Nothing runs in the background, so there is nothing to stop
    pub fn stop(&mut self) {}

    /// Current lifecycle state
    pub fn state(&self) -> ManagerState {
        self.state
    }
}

impl fmt::Debug for ImmutableConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableConfigManager")
            .field("source", &self.source.source_type())
            .field("state", &self.state)
            .finish()
    }
}
