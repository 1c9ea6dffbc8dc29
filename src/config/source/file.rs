//! File configuration source
//!
//! Polls a local file's modification time and re-reads the whole file when it moves.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use log::{debug, error};

use super::{ConfigSource, FailureCause, SourceType};
use crate::common::{fs, Result};
use crate::config::value::{ConfigFormat, ConfigValue};

/// File configuration source
pub struct FileSource {
    path: PathBuf,
    format: ConfigFormat,
    modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source
    pub fn new<P: AsRef<Path>>(path: P, format: ConfigFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
            modified: None,
        }
    }

    /// File being watched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format used to parse the file
    pub fn format(&self) -> ConfigFormat {
        self.format
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    async fn needs_reload(&mut self) -> bool {
        match fs::modified_time(&self.path).await {
            Ok(modified) if self.modified == Some(modified) => false,
            Ok(modified) => {
                debug!("Configuration file {} modified", self.path.display());
                self.modified = Some(modified);
                true
            }
            Err(e) => {
                // Let reload surface the error
                error!("Error reading attributes of {}: {}", self.path.display(), e);
                true
            }
        }
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        debug!("Loading configuration from file: {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path).await?;
        self.format.parse(&content)
    }

    async fn report_success(&mut self) {}

    async fn report_failure(&mut self, _code: &str, _message: &str, _cause: Option<&FailureCause>) {}

    fn source_type(&self) -> SourceType {
        SourceType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path, offset: Duration) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + offset).unwrap();
    }

    #[tokio::test]
    async fn test_reload_follows_modification_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();

        let mut source = FileSource::new(&path, ConfigFormat::Json);
        assert!(source.needs_reload().await);
        assert_eq!(source.reload().await.unwrap(), json!({"a": 1}));
        assert!(!source.needs_reload().await);

        std::fs::write(&path, r#"{"a": 2}"#).unwrap();
        touch(&path, Duration::from_secs(60));
        assert!(source.needs_reload().await);
        assert_eq!(source.reload().await.unwrap(), json!({"a": 2}));
        assert!(!source.needs_reload().await);
    }

    #[tokio::test]
    async fn test_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(&path, "name: svc\nreplicas: 3\n").unwrap();

        let mut source = FileSource::new(&path, ConfigFormat::Yaml);
        assert_eq!(source.reload().await.unwrap(), json!({"name": "svc", "replicas": 3}));
    }

    #[tokio::test]
    async fn test_error_classification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.json");

        let mut source = FileSource::new(&path, ConfigFormat::Json);
        assert!(source.needs_reload().await);
        let err = source.reload().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        std::fs::write(&path, "{ not json").unwrap();
        let err = source.reload().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
    }
}
