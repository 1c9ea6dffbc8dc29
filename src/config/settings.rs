//! Process settings
//!
//! The handful of environment variables the factory consults, loaded through the `config`
//! crate so they can be layered and overridden the same way as any other settings.

use std::path::PathBuf;

use config::{Config, Environment};
use log::debug;
use serde::Deserialize;

use crate::common::Result;

/// Settings read from the process environment
///
/// Field names are the lower-cased environment variable names.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Primary configuration address (`CONFIGURATION`)
    pub configuration: Option<String>,

    /// Fallback configuration address (`CONFIG`)
    pub config: Option<String>,

    /// Response cache directory (`CONFIGURATION_CACHE`)
    pub configuration_cache: Option<PathBuf>,

    /// Secret provider address (`SECRETS`)
    pub secrets: Option<String>,
}

impl Settings {
    /// Load settings from the environment
    pub fn from_env() -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;

        debug!(
            "Loaded settings: address defined = {}, cache = {:?}, secrets defined = {}",
            settings.address().is_some(),
            settings.configuration_cache,
            settings.secrets.is_some()
        );

        Ok(settings)
    }

    /// The configuration address, preferring `CONFIGURATION` over `CONFIG`
    pub fn address(&self) -> Option<&str> {
        [self.configuration.as_deref(), self.config.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::{CACHE_DIR_ENV, CONFIGURATION_ENV, CONFIG_ENV, SECRETS_ENV};
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_primary_address_wins() {
        env::set_var(CONFIGURATION_ENV, "debug:/tmp/primary.json");
        env::set_var(CONFIG_ENV, "debug:/tmp/fallback.json");

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.address(), Some("debug:/tmp/primary.json"));

        env::remove_var(CONFIGURATION_ENV);
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.address(), Some("debug:/tmp/fallback.json"));

        env::remove_var(CONFIG_ENV);
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.address(), None);
    }

    #[test]
    #[serial]
    fn test_cache_directory() {
        env::set_var(CACHE_DIR_ENV, "/var/cache/courier");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.configuration_cache, Some(PathBuf::from("/var/cache/courier")));
        env::remove_var(CACHE_DIR_ENV);
    }

    #[test]
    #[serial]
    fn test_secrets_address() {
        env::set_var(SECRETS_ENV, "docker:app_secrets");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.secrets.as_deref(), Some("docker:app_secrets"));
        env::remove_var(SECRETS_ENV);
    }
}
