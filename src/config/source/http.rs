//! HTTP configuration source

use async_trait::async_trait;
use log::{debug, error, warn};

use super::remote::{self, RemoteDocument};
use super::{ConfigSource, FailureCause, SourceType};
use crate::common::{ConfigureError, ErrorKind, Result};
use crate::config::cache::ResponseCache;
use crate::config::defaults::INVALID_CONTENT_CODE;
use crate::config::value::ConfigValue;

/// Polls a plain HTTP(S) endpoint
///
/// The endpoint has no feedback channel, so success and failure reports only get logged.
pub struct HttpSource {
    document: RemoteDocument,
}

impl HttpSource {
    /// Create a source for `url`
    ///
    /// With a cache the last good response is loaded immediately and offered on the first
    /// reload, before the endpoint has been contacted.
    pub fn new(url: &str, cache: Option<ResponseCache>) -> Result<Self> {
        Self::with_client(remote::http_client()?, url, cache)
    }

    /// Create a source sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, url: &str, cache: Option<ResponseCache>) -> Result<Self> {
        remote::check_url(url)?;

        Ok(Self {
            document: RemoteDocument::new(client, url.to_string(), cache),
        })
    }

    /// Endpoint address
    pub fn url(&self) -> &str {
        self.document.url()
    }
}

#[async_trait]
impl ConfigSource for HttpSource {
    async fn needs_reload(&mut self) -> bool {
        if let Err(e) = self.document.check().await {
            if e.kind() == ErrorKind::Structural {
                error!("Invalid configuration from {}: {}", self.document.url(), e);
                let message = match &e {
                    ConfigureError::ContentType(_) => "Configuration data is not a known MIME type",
                    _ => "Configuration is not well-formed",
                };
                self.report_failure(INVALID_CONTENT_CODE, message, Some(&e as &FailureCause))
                    .await;
            } else {
                error!("Error reading configuration from {}: {}", self.document.url(), e);
            }
        }

        self.document.needs_load()
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        if !self.document.has_value() {
            self.document.check().await?;
        }

        self.document.take_for_load().ok_or_else(|| {
            ConfigureError::Other(format!("No configuration available from {}", self.document.url()))
        })
    }

    async fn report_success(&mut self) {
        debug!("Configuration from {} applied", self.document.url());
    }

    async fn report_failure(&mut self, code: &str, message: &str, cause: Option<&FailureCause>) {
        match cause {
            Some(cause) => warn!(
                "Configuration from {} failed ({}): {}: {}",
                self.document.url(),
                code,
                message,
                cause
            ),
            None => warn!(
                "Configuration from {} failed ({}): {}",
                self.document.url(),
                code,
                message
            ),
        }
    }

    fn source_type(&self) -> SourceType {
        SourceType::Http
    }
}
