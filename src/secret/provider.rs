//! Secret providers

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};

use super::SecretProvider;
use crate::common::{fs, ConfigureError, Result};

/// Provider with no secrets at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSecretProvider;

impl SecretProvider for NullSecretProvider {
    fn secret(&self, name: &str) -> Result<String> {
        Err(ConfigureError::SecretNotDefined(name.to_string()))
    }
}

/// Secrets read from a properties file
///
/// One `name = value` (or `name: value`) pair per line; lines starting with `#` or `!`
/// are comments.
#[derive(Debug, Clone, Default)]
pub struct PropertyFileSecretProvider {
    secrets: HashMap<String, String>,
}

impl PropertyFileSecretProvider {
    /// Load a properties file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        fs::check_file_exists(path)?;

        let content = std::fs::read_to_string(path)?;
        let provider = Self::parse(&content);
        debug!("Loaded {} secrets from {}", provider.secrets.len(), path.display());

        Ok(provider)
    }

    /// Parse properties text
    pub fn parse(content: &str) -> Self {
        let secrets = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| {
                let (name, value) = line.split_once(|c| c == '=' || c == ':')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .filter(|(name, _)| !name.is_empty())
            .collect();

        Self { secrets }
    }
}

impl SecretProvider for PropertyFileSecretProvider {
    fn secret(&self, name: &str) -> Result<String> {
        let value = self
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigureError::SecretNotDefined(name.to_string()))?;

        info!("Dereferenced secret {}", name);
        Ok(value)
    }
}
