//! On-disk response cache
//!
//! Remote sources keep the last good response on disk so a cold start can apply a known
//! configuration before the network answers. The file holds the content type on the first
//! line and the raw body after it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};

use crate::common::Result;
use crate::config::defaults::CACHE_EXTENSION;
use crate::config::value::{ConfigFormat, ConfigValue, Fingerprint};

/// A cached response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Content type line as received
    pub content_type: String,
    /// Raw body
    pub body: String,
}

impl CachedResponse {
    /// Parse the cached body according to its content type
    pub fn parse(&self) -> Result<ConfigValue> {
        ConfigFormat::from_content_type(&self.content_type)?.parse(&self.body)
    }
}

/// Cache file owned by a single source
#[derive(Debug, Clone)]
pub struct ResponseCache {
    path: PathBuf,
}

impl ResponseCache {
    /// Cache file at an explicit path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Cache file inside `dir`, named after a digest of `key`
    ///
    /// The key is usually a URL or an access token; hashing it keeps two sources from
    /// sharing a file and keeps the token itself off the disk.
    pub fn for_key<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        let name = format!("{}.{}", Fingerprint::of_bytes(key.as_bytes()).as_str(), CACHE_EXTENSION);
        Self::new(dir.as_ref().join(name))
    }

    /// Cache file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached response, if any
    pub fn read(&self) -> io::Result<Option<CachedResponse>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let (content_type, body) = match content.split_once('\n') {
            Some((content_type, body)) => (content_type.trim_end_matches('\r'), body),
            None => (content.as_str(), ""),
        };

        Ok(Some(CachedResponse {
            content_type: content_type.to_string(),
            body: body.to_string(),
        }))
    }

    /// Load and parse the cached value, logging anything that goes wrong
    ///
    /// Used once at source construction to seed the last known good configuration.
    pub fn load_value(&self) -> Option<ConfigValue> {
        match self.read() {
            Ok(Some(cached)) => match cached.parse() {
                Ok(value) => {
                    debug!("Seeded configuration from cache {}", self.path.display());
                    Some(value)
                }
                Err(e) => {
                    error!("Error parsing configuration cache {}: {}", self.path.display(), e);
                    None
                }
            },
            Ok(None) => {
                warn!(
                    "Configuration cache {} not present. If this is not an initial installation this could be a problem.",
                    self.path.display()
                );
                None
            }
            Err(e) => {
                error!("Error loading configuration cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Replace the cached response
    pub async fn store(&self, content_type: &str, body: &str) -> io::Result<()> {
        let mut content = String::with_capacity(content_type.len() + body.len() + 1);
        content.push_str(content_type);
        content.push('\n');
        content.push_str(body);

        tokio::fs::write(&self.path, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_then_seed_keeps_fingerprint() {
        let dir = tempdir().unwrap();
        let cache = ResponseCache::for_key(dir.path(), "https://config.example.com/app");

        let body = "{\"service\": {\"port\": 8080, \"debug\": false}}";
        let fetched = ConfigFormat::Json.parse(body).unwrap();
        cache.store("application/json; charset=utf-8", body).await.unwrap();

        let seeded = ResponseCache::for_key(dir.path(), "https://config.example.com/app")
            .load_value()
            .unwrap();
        assert_eq!(Fingerprint::of(&seeded), Fingerprint::of(&fetched));
    }

    #[test]
    fn test_missing_cache() {
        let dir = tempdir().unwrap();
        let cache = ResponseCache::for_key(dir.path(), "token");
        assert_eq!(cache.read().unwrap(), None);
        assert_eq!(cache.load_value(), None);
    }

    #[test]
    fn test_unknown_content_type_is_not_seeded() {
        let dir = tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("bad.dat"));
        fs::write(cache.path(), "text/html\n<html></html>").unwrap();

        let cached = cache.read().unwrap().unwrap();
        assert_eq!(cached.content_type, "text/html");
        assert_eq!(cache.load_value(), None);
    }

    #[test]
    fn test_file_name_hides_key() {
        let dir = tempdir().unwrap();
        let cache = ResponseCache::for_key(dir.path(), "secret-token");
        let name = cache.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(!name.contains("secret-token"));
        assert!(name.ends_with(".dat"));
    }
}
