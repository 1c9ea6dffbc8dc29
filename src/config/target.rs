//! Configuration target
//!
//! The consumer side of the pipeline, implemented by the embedding application.

use async_trait::async_trait;

use crate::common::TargetError;
use crate::config::value::ConfigValue;

/// Consumer of delivered configurations
#[async_trait]
pub trait ConfigTarget: Send + Sync {
    /// Adopt a new configuration
    ///
    /// Returning an error rejects the configuration; the manager reports the rejection to
    /// the source. The target owns its own all-or-nothing semantics: on error the previous
    /// configuration is assumed to remain in effect.
    async fn apply(&self, config: ConfigValue) -> Result<(), TargetError>;

    /// Request process shutdown
    ///
    /// Called when a configuration cannot be obtained at all. Must be safe to call from the
    /// manager's background task.
    fn shutdown(&self);
}
