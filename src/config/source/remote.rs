//! Shared plumbing for HTTP-backed sources
//!
//! Fetches a document, maps its content type to a parser, and keeps the last good value
//! together with its fingerprint and an optional on-disk copy.

use log::{debug, error, info, warn};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::common::{ConfigureError, Result};
use crate::config::cache::ResponseCache;
use crate::config::defaults::{request_timeout, DEFAULT_CONTENT_TYPE, USER_AGENT};
use crate::config::value::{ConfigFormat, ConfigValue, Fingerprint};

/// Build the HTTP client used by remote sources
pub(crate) fn http_client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(request_timeout())
        .build()?;
    Ok(client)
}

/// Reject anything reqwest could not send a request to
pub(crate) fn check_url(url: &str) -> Result<()> {
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ConfigureError::Address(format!("{}: {}", url, e)))
}

/// A remote configuration document
pub(crate) struct RemoteDocument {
    client: Client,
    url: String,
    cache: Option<ResponseCache>,
    current: Option<ConfigValue>,
    fingerprint: Option<Fingerprint>,
    needs_load: bool,
}

impl RemoteDocument {
    /// Create a document, seeding it from the cache when one is present
    pub(crate) fn new(client: Client, url: String, cache: Option<ResponseCache>) -> Self {
        let current = cache.as_ref().and_then(ResponseCache::load_value);
        let fingerprint = current.as_ref().and_then(Fingerprint::of);

        Self {
            client,
            url,
            cache,
            current,
            fingerprint,
            needs_load: true,
        }
    }

    /// Document address
    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Client shared with the owning source
    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Whether a value is waiting to be handed out
    pub(crate) fn needs_load(&self) -> bool {
        self.needs_load && self.current.is_some()
    }

    /// Whether any value, fetched or cached, is known
    pub(crate) fn has_value(&self) -> bool {
        self.current.is_some()
    }

    /// Hand out the current value and clear the pending flag
    pub(crate) fn take_for_load(&mut self) -> Option<ConfigValue> {
        let value = self.current.clone()?;
        self.needs_load = false;
        Some(value)
    }

    /// Fetch the document once
    ///
    /// Returns whether the value differs from the one held before. A changed value is marked
    /// pending and written to the cache; nothing is touched on error.
    pub(crate) async fn check(&mut self) -> Result<bool> {
        let (content_type, body) = self.fetch().await?;

        let value = ConfigFormat::from_content_type(&content_type)?.parse(&body)?;
        let fingerprint = Fingerprint::of(&value);

        if self.current.is_some()
            && !Fingerprint::changed(self.fingerprint.as_ref(), fingerprint.as_ref())
        {
            debug!("Configuration at {} unchanged", self.url);
            return Ok(false);
        }

        info!("Configuration changed at {}", self.url);
        self.current = Some(value);
        self.fingerprint = fingerprint;
        self.needs_load = true;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&content_type, &body).await {
                error!("Error writing configuration cache {}: {}", cache.path().display(), e);
            }
        }

        Ok(true)
    }

    async fn fetch(&self) -> Result<(String, String)> {
        debug!("Fetching configuration from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            debug!("Response from {} with status {}: {}", self.url, status, body);
            return Err(ConfigureError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            Some(content_type) => content_type.to_string(),
            None => {
                warn!("No content type from {}, assuming {}", self.url, DEFAULT_CONTENT_TYPE);
                DEFAULT_CONTENT_TYPE.to_string()
            }
        };

        let body = response.text().await?;
        Ok((content_type, body))
    }
}
