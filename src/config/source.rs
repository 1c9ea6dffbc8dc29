//! Configuration sources
//!
//! This module defines the pull contract every source implements and the closed set of
//! source variants the factory can build.

mod appconfig;
mod file;
mod http;
mod managed;
mod remote;
mod secret_file;

pub use self::appconfig::{
    AlarmNotifier, AppConfigClient, AppConfigSource, LatestConfiguration, SessionRequest,
};
pub use self::file::FileSource;
pub use self::http::HttpSource;
pub use self::managed::ManagedSource;
pub use self::secret_file::SecretFileSource;

use std::fmt;

use async_trait::async_trait;

use crate::common::Result;
use crate::config::value::ConfigValue;

/// Error handed to [`ConfigSource::report_failure`] as the cause of a failure
pub type FailureCause = dyn std::error::Error + Send + Sync;

/// Kind of source, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Local file, polled by modification time
    File,
    /// Secret file read once
    SecretFile,
    /// Plain HTTP endpoint
    Http,
    /// Remote service accepting confirm/reject feedback
    Managed,
    /// Session based cloud configuration service
    AppConfig,
    /// Anything implemented outside this crate
    Custom,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::SecretFile => write!(f, "secret-file"),
            Self::Http => write!(f, "http"),
            Self::Managed => write!(f, "managed"),
            Self::AppConfig => write!(f, "appconfig"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Configuration source trait
///
/// A source is owned by exactly one manager, which drives it from a single task.
#[async_trait]
pub trait ConfigSource: Send {
    /// Whether a new configuration should be loaded
    ///
    /// When this returns true the caller must follow up with [`reload`](Self::reload)
    /// promptly; several sources fetch here and hand out the cached result on reload.
    async fn needs_reload(&mut self) -> bool;

    /// Load the configuration
    ///
    /// Structural errors (unparsable content) and transport errors (I/O, network, status)
    /// are told apart through [`ConfigureError::kind`](crate::common::ConfigureError::kind).
    async fn reload(&mut self) -> Result<ConfigValue>;

    /// The last delivered configuration was applied
    async fn report_success(&mut self);

    /// The last delivered configuration failed
    async fn report_failure(&mut self, code: &str, message: &str, cause: Option<&FailureCause>);

    /// Get the source type
    fn source_type(&self) -> SourceType {
        SourceType::Custom
    }
}

/// Every source the factory knows how to build
pub enum Source {
    /// Local file
    File(FileSource),
    /// Docker style secret file
    SecretFile(SecretFileSource),
    /// HTTP endpoint
    Http(HttpSource),
    /// Acknowledging remote service
    Managed(ManagedSource),
    /// Session based cloud service
    AppConfig(AppConfigSource),
}

#[async_trait]
impl ConfigSource for Source {
    async fn needs_reload(&mut self) -> bool {
        match self {
            Self::File(source) => source.needs_reload().await,
            Self::SecretFile(source) => source.needs_reload().await,
            Self::Http(source) => source.needs_reload().await,
            Self::Managed(source) => source.needs_reload().await,
            Self::AppConfig(source) => source.needs_reload().await,
        }
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        match self {
            Self::File(source) => source.reload().await,
            Self::SecretFile(source) => source.reload().await,
            Self::Http(source) => source.reload().await,
            Self::Managed(source) => source.reload().await,
            Self::AppConfig(source) => source.reload().await,
        }
    }

    async fn report_success(&mut self) {
        match self {
            Self::File(source) => source.report_success().await,
            Self::SecretFile(source) => source.report_success().await,
            Self::Http(source) => source.report_success().await,
            Self::Managed(source) => source.report_success().await,
            Self::AppConfig(source) => source.report_success().await,
        }
    }

    async fn report_failure(&mut self, code: &str, message: &str, cause: Option<&FailureCause>) {
        match self {
            Self::File(source) => source.report_failure(code, message, cause).await,
            Self::SecretFile(source) => source.report_failure(code, message, cause).await,
            Self::Http(source) => source.report_failure(code, message, cause).await,
            Self::Managed(source) => source.report_failure(code, message, cause).await,
            Self::AppConfig(source) => source.report_failure(code, message, cause).await,
        }
    }

    fn source_type(&self) -> SourceType {
        match self {
            Self::File(source) => source.source_type(),
            Self::SecretFile(source) => source.source_type(),
            Self::Http(source) => source.source_type(),
            Self::Managed(source) => source.source_type(),
            Self::AppConfig(source) => source.source_type(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Source").field(&self.source_type()).finish()
    }
}
