//! Managed configuration source
//!
//! Talks to a configuration service that expects to hear back about every configuration
//! it hands out. Each changed document is confirmed or rejected exactly once.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::StatusCode;
use serde_json::json;

use super::remote::{self, RemoteDocument};
use super::{ConfigSource, FailureCause, SourceType};
use crate::common::{ConfigureError, ErrorKind, Result};
use crate::config::cache::ResponseCache;
use crate::config::defaults::{startup_retry, INVALID_CONTENT_CODE};
use crate::config::value::ConfigValue;

/// Source backed by the managed configuration service
pub struct ManagedSource {
    document: RemoteDocument,
    confirm_url: String,
    reject_url: String,
    needs_report: bool,
    startup_retry: Duration,
}

impl ManagedSource {
    /// Create a source for `token` on `host`
    ///
    /// The token is part of every URL and is what authorizes the requests. The cache file,
    /// when a directory is given, is named after a digest of the token.
    pub fn new(host: &str, token: &str, cache_dir: Option<&Path>) -> Result<Self> {
        let url = format!("https://{}/api/v1/cfg/direct/{}", host, token);
        let cache = cache_dir.map(|dir| ResponseCache::for_key(dir, token));
        Self::with_url(&url, cache)
    }

    /// Create a source for an explicit document URL
    ///
    /// Feedback goes to `<url>/confirm` and `<url>/reject`.
    pub fn with_url(url: &str, cache: Option<ResponseCache>) -> Result<Self> {
        remote::check_url(url)?;
        let base = url.trim_end_matches('/');

        Ok(Self {
            document: RemoteDocument::new(remote::http_client()?, url.to_string(), cache),
            confirm_url: format!("{}/confirm", base),
            reject_url: format!("{}/reject", base),
            needs_report: false,
            startup_retry: startup_retry(),
        })
    }

    /// Override the wait between cold-start attempts
    pub fn with_startup_retry(mut self, retry: Duration) -> Self {
        self.startup_retry = retry;
        self
    }

    /// Document address
    pub fn url(&self) -> &str {
        self.document.url()
    }

    async fn check(&mut self) {
        match self.document.check().await {
            Ok(true) => self.needs_report = true,
            Ok(false) => {}
            Err(e) if e.kind() == ErrorKind::Structural => {
                error!("Invalid configuration from {}: {}", self.document.url(), e);
                self.report_failure(
                    INVALID_CONTENT_CODE,
                    "Configuration is not well-formed",
                    Some(&e as &FailureCause),
                )
                .await;
            }
            Err(e) => error!("Error reading configuration from {}: {}", self.document.url(), e),
        }
    }

    /// POST feedback and validate the service's answer
    async fn upload(&self, url: &str, body: serde_json::Value) -> Result<()> {
        let response = self.document.client().post(url).json(&body).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConfigureError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let answer: serde_json::Value = response.json().await?;
        if !answer.is_object() {
            return Err(ConfigureError::ResponseFormat(format!(
                "expected a JSON object from {}",
                url
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigSource for ManagedSource {
    /// Also true while nothing is known yet, so a manager enters the cold-start wait in
    /// [`reload`](ConfigSource::reload)
    async fn needs_reload(&mut self) -> bool {
        self.check().await;
        self.document.needs_load() || !self.document.has_value()
    }

    /// Block until a configuration is known
    ///
    /// A process cannot run unconfigured, so a cold start with no cache keeps retrying at a
    /// fixed interval instead of failing.
    async fn reload(&mut self) -> Result<ConfigValue> {
        loop {
            if let Some(value) = self.document.take_for_load() {
                return Ok(value);
            }

            self.check().await;
            if let Some(value) = self.document.take_for_load() {
                return Ok(value);
            }

            warn!(
                "No configuration from {} yet, retrying in {:?}",
                self.document.url(),
                self.startup_retry
            );
            tokio::time::sleep(self.startup_retry).await;
        }
    }

    async fn report_success(&mut self) {
        if !self.needs_report {
            return;
        }

        match self.upload(&self.confirm_url, json!({})).await {
            Ok(()) => {
                info!("Confirmed configuration with {}", self.confirm_url);
                self.needs_report = false;
            }
            Err(e) => error!("Error confirming configuration with {}: {}", self.confirm_url, e),
        }
    }

    async fn report_failure(&mut self, code: &str, message: &str, cause: Option<&FailureCause>) {
        if let Some(cause) = cause {
            warn!("Configuration failed ({}): {}: {}", code, message, cause);
        }

        if !self.needs_report {
            return;
        }

        let body = json!({ "code": code, "message": message });
        match self.upload(&self.reject_url, body).await {
            Ok(()) => {
                info!("Rejected configuration with {} ({})", self.reject_url, code);
                self.needs_report = false;
            }
            Err(e) => error!("Error rejecting configuration with {}: {}", self.reject_url, e),
        }
    }

    fn source_type(&self) -> SourceType {
        SourceType::Managed
    }
}
