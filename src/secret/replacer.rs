//! Secret references in strings

use std::sync::Arc;

use super::SecretProvider;
use crate::common::Result;

/// Resolves secret references embedded in a string
pub trait SecretReplacer: Send + Sync {
    /// Return `input` with any references resolved
    fn replace(&self, input: &str) -> Result<String>;
}

/// Treats a whole string of the form `@name` as a reference to secret `name`
#[derive(Clone)]
pub struct AtIdSecretReplacer {
    provider: Arc<dyn SecretProvider>,
}

impl AtIdSecretReplacer {
    /// Create a replacer backed by `provider`
    pub fn new(provider: Arc<dyn SecretProvider>) -> Self {
        Self { provider }
    }
}

impl SecretReplacer for AtIdSecretReplacer {
    fn replace(&self, input: &str) -> Result<String> {
        match input.strip_prefix('@') {
            Some(name) => self.provider.secret(name),
            None => Ok(input.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::MockSecretProvider;

    #[test]
    fn test_only_at_prefixed_strings_are_looked_up() {
        let mut provider = MockSecretProvider::new();
        provider
            .expect_secret()
            .withf(|name| name == "host")
            .times(1)
            .returning(|_| Ok("cfg.internal".to_string()));

        let replacer = AtIdSecretReplacer::new(Arc::new(provider));
        assert_eq!(replacer.replace("@host").unwrap(), "cfg.internal");
        assert_eq!(replacer.replace("plain").unwrap(), "plain");
        assert_eq!(replacer.replace("a@b").unwrap(), "a@b");
    }
}
