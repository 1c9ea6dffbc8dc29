//! Secret file configuration source
//!
//! Secrets mounted into a container cannot change during the process lifetime, so the
//! file is read once and the value handed out from then on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::info;

use super::{ConfigSource, FailureCause, SourceType};
use crate::common::{fs, Result};
use crate::config::value::{ConfigFormat, ConfigValue};

/// Immutable, secret-backed configuration source
pub struct SecretFileSource {
    path: PathBuf,
    format: ConfigFormat,
    value: Option<ConfigValue>,
}

impl SecretFileSource {
    /// Create a new secret file source
    ///
    /// Fails when the file does not exist, so a missing secret is reported before any
    /// manager is built.
    pub fn new<P: AsRef<Path>>(path: P, format: ConfigFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::check_file_exists(&path)?;

        Ok(Self {
            path,
            format,
            value: None,
        })
    }

    /// Secret file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for SecretFileSource {
    async fn needs_reload(&mut self) -> bool {
        self.value.is_none()
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        if let Some(value) = &self.value {
            return Ok(value.clone());
        }

        info!("Reading configuration secret {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await?;
        let value = self.format.parse(&content)?;
        self.value = Some(value.clone());

        Ok(value)
    }

    async fn report_success(&mut self) {}

    async fn report_failure(&mut self, _code: &str, _message: &str, _cause: Option<&FailureCause>) {}

    fn source_type(&self) -> SourceType {
        SourceType::SecretFile
    }
}
