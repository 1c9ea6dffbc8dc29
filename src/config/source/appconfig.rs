//! Cloud application configuration source
//!
//! The service hands out configurations through a session: a session token buys the
//! latest configuration and a token for the next call. An empty payload means nothing
//! changed since the previous call.
//!
//! The wire client is abstracted behind [`AppConfigClient`] so the embedding application
//! decides how requests are signed and sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};

use super::{ConfigSource, FailureCause, SourceType};
use crate::common::{ConfigureError, Result};
use crate::config::value::{ConfigFormat, ConfigValue};

/// Parameters of a configuration session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Application identifier
    pub application: String,
    /// Configuration profile identifier
    pub configuration: String,
    /// Environment identifier
    pub environment: String,
    /// Smallest interval the service should expect between calls
    pub minimum_poll_interval: Duration,
}

/// Answer to a latest-configuration call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestConfiguration {
    /// Token for the next call
    pub next_token: String,
    /// Payload; empty when nothing changed
    pub content: Vec<u8>,
    /// Payload content type
    pub content_type: Option<String>,
}

/// Client for the configuration data service
#[async_trait]
pub trait AppConfigClient: Send + Sync {
    /// Start a session and return its initial token
    async fn start_session(&self, request: &SessionRequest) -> Result<String>;

    /// Fetch the latest configuration for a session token
    async fn latest_configuration(&self, token: &str) -> Result<LatestConfiguration>;
}

/// Raises a named alarm when a configuration is rejected
#[async_trait]
pub trait AlarmNotifier: Send + Sync {
    /// Put `alarm` into the alarm state
    async fn raise(&self, alarm: &str) -> Result<()>;
}

/// Session based configuration source
pub struct AppConfigSource {
    client: Arc<dyn AppConfigClient>,
    request: SessionRequest,
    session: Option<String>,
    config: Option<ConfigValue>,
    pending: bool,
    alarm: Option<(String, Arc<dyn AlarmNotifier>)>,
}

impl AppConfigSource {
    /// Create a new source
    pub fn new(client: Arc<dyn AppConfigClient>, request: SessionRequest) -> Self {
        Self {
            client,
            request,
            session: None,
            config: None,
            pending: false,
            alarm: None,
        }
    }

    /// Raise `alarm` through `notifier` whenever a configuration fails
    pub fn with_alarm(mut self, alarm: &str, notifier: Arc<dyn AlarmNotifier>) -> Self {
        self.alarm = Some((alarm.to_string(), notifier));
        self
    }

    /// Session parameters
    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    /// Fetch the latest configuration, starting a session if needed
    async fn refresh(&mut self) -> Result<()> {
        // A failed call leaves no session behind; the next call starts a new one
        let token = match self.session.take() {
            Some(token) => token,
            None => {
                debug!(
                    "Starting configuration session for {}/{}/{}",
                    self.request.application, self.request.configuration, self.request.environment
                );
                self.client.start_session(&self.request).await?
            }
        };

        let latest = self.client.latest_configuration(&token).await?;
        self.session = Some(latest.next_token);

        if latest.content.is_empty() {
            debug!("No configuration change");
            return Ok(());
        }

        let content_type = latest.content_type.as_deref().ok_or_else(|| {
            ConfigureError::ContentType("<none>".to_string())
        })?;
        let value = ConfigFormat::from_content_type(content_type)?.parse_bytes(&latest.content)?;

        info!(
            "New configuration received for {}/{}/{}",
            self.request.application, self.request.configuration, self.request.environment
        );
        self.config = Some(value);
        self.pending = true;

        Ok(())
    }
}

#[async_trait]
impl ConfigSource for AppConfigSource {
    async fn needs_reload(&mut self) -> bool {
        if let Err(e) = self.refresh().await {
            error!("Error retrieving configuration: {}", e);
        }
        self.pending
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        if self.config.is_none() {
            self.refresh().await?;
        }

        self.pending = false;
        self.config.clone().ok_or_else(|| {
            ConfigureError::Service("no configuration has been deployed yet".to_string())
        })
    }

    async fn report_success(&mut self) {}

    async fn report_failure(&mut self, code: &str, message: &str, cause: Option<&FailureCause>) {
        match cause {
            Some(cause) => error!("Configuration failed ({}): {}: {}", code, message, cause),
            None => error!("Configuration failed ({}): {}", code, message),
        }

        if let Some((alarm, notifier)) = &self.alarm {
            if let Err(e) = notifier.raise(alarm).await {
                error!("Error raising alarm {}: {}", alarm, e);
            }
        }
    }

    fn source_type(&self) -> SourceType {
        SourceType::AppConfig
    }
}
