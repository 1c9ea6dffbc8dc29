//! Structured configuration values
//!
//! Every source produces a [`ConfigValue`], whatever format it was written in. Change
//! detection works on a [`Fingerprint`] of the value's canonical JSON form.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::common::{ConfigureError, Result};

/// Format-agnostic configuration tree
///
/// Produced fresh on every successful fetch and never mutated afterwards.
pub type ConfigValue = serde_json::Value;

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// JSON document
    #[default]
    Json,
    /// YAML document
    Yaml,
}

impl ConfigFormat {
    /// Guess the format from a file name's extension
    pub fn from_extension(name: &str) -> Option<Self> {
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }

        match extension {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Map an HTTP content type to a format
    ///
    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/json" => Ok(Self::Json),
            "application/yaml" | "application/x-yaml" | "text/yaml" => Ok(Self::Yaml),
            _ => Err(ConfigureError::ContentType(content_type.to_string())),
        }
    }

    /// Parse a document into a configuration value
    pub fn parse(&self, content: &str) -> Result<ConfigValue> {
        let value = match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(value)
    }

    /// Parse raw bytes, which must be UTF-8
    pub fn parse_bytes(&self, content: &[u8]) -> Result<ConfigValue> {
        let text = std::str::from_utf8(content)
            .map_err(|e| ConfigureError::Parse(format!("Illegal characters in configuration: {}", e)))?;
        self.parse(text)
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigureError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Content digest used for change detection
///
/// Equality only; this is not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a value
    ///
    /// Returns `None` when no canonical form can be produced; callers treat such values as
    /// always changed.
    pub fn of(value: &ConfigValue) -> Option<Self> {
        match serde_json::to_vec(&canonical(value)) {
            Ok(canonical) => Some(Self::of_bytes(&canonical)),
            Err(e) => {
                debug!("Unable to serialize configuration for fingerprinting: {}", e);
                None
            }
        }
    }

    /// Fingerprint raw bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `next` differs from `previous`, treating unknown fingerprints as changed
    pub fn changed(previous: Option<&Fingerprint>, next: Option<&Fingerprint>) -> bool {
        match (previous, next) {
            (Some(previous), Some(next)) => previous != next,
            _ => true,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A prefix is plenty for log lines
        write!(f, "{}", &self.0[..self.0.len().min(12)])
    }
}

/// Copy of `value` with every object's keys in sorted order
///
/// `serde_json` maps are sorted already unless `preserve_order` is switched on somewhere in
/// the dependency graph, in which case the insertion order would leak into the digest.
fn canonical(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            ConfigValue::Object(
                entries
                    .into_iter()
                    .map(|(key, item)| (key.clone(), canonical(item)))
                    .collect(),
            )
        }
        ConfigValue::Array(items) => ConfigValue::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("app.json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("app.yaml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("app.yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("app.toml"), None);
        assert_eq!(ConfigFormat::from_extension("app"), None);
        assert_eq!(ConfigFormat::from_extension(".json"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ConfigFormat>().unwrap(), ConfigFormat::Json);
        assert_eq!("yml".parse::<ConfigFormat>().unwrap(), ConfigFormat::Yaml);
        assert!(matches!(
            "xml".parse::<ConfigFormat>(),
            Err(ConfigureError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            ConfigFormat::from_content_type("application/json; charset=utf-8").unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_content_type("application/yaml").unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigFormat::from_content_type("text/html").is_err());
    }

    #[test]
    fn test_parse_yaml_and_json_agree() {
        let from_json = ConfigFormat::Json.parse(r#"{"name": "svc", "ports": [80, 443]}"#).unwrap();
        let from_yaml = ConfigFormat::Yaml.parse("name: svc\nports:\n  - 80\n  - 443\n").unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let err = ConfigFormat::Json.parse_bytes(&[0x7b, 0xff, 0x7d]).unwrap_err();
        assert!(matches!(err, ConfigureError::Parse(_)));
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = ConfigFormat::Json.parse(r#"{"a": 1, "b": {"x": true, "y": null}}"#).unwrap();
        let b = ConfigFormat::Json.parse(r#"{"b": {"y": null, "x": true}, "a": 1}"#).unwrap();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));

        let c = json!({"a": 2, "b": {"x": true, "y": null}});
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&c));
    }

    #[test]
    fn test_changed_without_previous() {
        let fp = Fingerprint::of(&json!({"a": 1}));
        assert!(Fingerprint::changed(None, fp.as_ref()));
        assert!(Fingerprint::changed(fp.as_ref(), None));
        assert!(!Fingerprint::changed(fp.as_ref(), fp.as_ref()));
    }
}
