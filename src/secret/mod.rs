//! Secret lookup
//!
//! Addresses may refer to credentials indirectly as `@name`; a [`SecretProvider`] resolves
//! the name. The provider itself is chosen by a small address string, usually from the
//! `SECRETS` environment variable.

mod provider;
mod replacer;

pub use self::provider::{NullSecretProvider, PropertyFileSecretProvider};
pub use self::replacer::{AtIdSecretReplacer, SecretReplacer};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
#[cfg(test)]
use mockall::automock;

use crate::common::{fs, ConfigureError, Result};
use crate::config::address::SourceAddress;
use crate::config::defaults::docker_secrets_dir;
use crate::config::settings::Settings;

/// Resolves secret names to values
#[cfg_attr(test, automock)]
pub trait SecretProvider: Send + Sync {
    /// Look up a secret, failing if it is not defined
    fn secret(&self, name: &str) -> Result<String>;
}

/// Builds secret providers from address strings
#[derive(Debug, Clone)]
pub struct SecretProviderFactory {
    secrets_dir: PathBuf,
}

impl Default for SecretProviderFactory {
    fn default() -> Self {
        Self {
            secrets_dir: docker_secrets_dir(),
        }
    }
}

impl SecretProviderFactory {
    /// Create a factory using the default docker secrets directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for docker secrets in `dir` instead
    pub fn with_secrets_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.secrets_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Create a provider from an address
    ///
    /// No address means every secret is undefined.
    ///
    /// * `docker:<name>` reads a properties file from the secrets directory
    /// * `debug:<path>` reads a properties file from anywhere
    pub fn create_from_string(&self, address: Option<&str>) -> Result<Arc<dyn SecretProvider>> {
        let address = match address {
            Some(address) if !address.trim().is_empty() => SourceAddress::parse(address)?,
            _ => return Ok(Arc::new(NullSecretProvider)),
        };

        match address.scheme() {
            "docker" => {
                let name = match address.segments() {
                    [name] => name,
                    segments => {
                        return Err(ConfigureError::PathSegments {
                            scheme: "docker".to_string(),
                            found: segments.len(),
                            expected: "docker:<secret name>",
                        })
                    }
                };
                if !fs::is_valid_file_name(name) {
                    return Err(ConfigureError::IllegalName(name.clone()));
                }

                let provider = PropertyFileSecretProvider::load(self.secrets_dir.join(name))?;
                Ok(Arc::new(provider))
            }
            "debug" => {
                if address.segment_count() < 1 {
                    return Err(ConfigureError::PathSegments {
                        scheme: "debug".to_string(),
                        found: 0,
                        expected: "debug:<path>",
                    });
                }

                warn!("Using debug secret provider from {}", address.path_as_local());
                let provider = PropertyFileSecretProvider::load(address.path_as_local())?;
                Ok(Arc::new(provider))
            }
            scheme => Err(ConfigureError::UnknownScheme(scheme.to_string())),
        }
    }

    /// Create the provider named by the `SECRETS` setting
    pub fn from_settings(&self, settings: &Settings) -> Result<Arc<dyn SecretProvider>> {
        self.create_from_string(settings.secrets.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_no_address_is_null_provider() {
        let provider = SecretProviderFactory::new().create_from_string(None).unwrap();
        let err = provider.secret("anything").unwrap_err();
        assert!(matches!(err, ConfigureError::SecretNotDefined(_)));
    }

    #[test]
    fn test_docker_provider() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app_secrets"), "db.password = hunter2\n").unwrap();

        let provider = SecretProviderFactory::new()
            .with_secrets_dir(dir.path())
            .create_from_string(Some("docker:app_secrets"))
            .unwrap();
        assert_eq!(provider.secret("db.password").unwrap(), "hunter2");
    }

    #[test]
    fn test_docker_provider_rejects_traversal() {
        let factory = SecretProviderFactory::new();
        let err = factory.create_from_string(Some("docker:..")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Address);

        let err = factory.create_from_string(Some("docker:a/b")).err().unwrap();
        assert!(matches!(err, ConfigureError::PathSegments { found: 2, .. }));
    }

    #[test]
    fn test_debug_provider_and_unknown_scheme() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.properties");
        std::fs::write(&path, "token: abc\n").unwrap();

        let factory = SecretProviderFactory::new();
        let provider = factory
            .create_from_string(Some(&format!("debug:{}", path.display())))
            .unwrap();
        assert_eq!(provider.secret("token").unwrap(), "abc");

        let err = factory.create_from_string(Some("vault:kv/app")).err().unwrap();
        assert!(matches!(err, ConfigureError::UnknownScheme(_)));
    }

    #[test]
    fn test_mock_provider() {
        let mut provider = MockSecretProvider::new();
        provider
            .expect_secret()
            .withf(|name| name == "token")
            .times(1)
            .returning(|_| Ok("s3cr3t".to_string()));

        assert_eq!(provider.secret("token").unwrap(), "s3cr3t");
    }
}
