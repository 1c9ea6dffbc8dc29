//! Error handling module
//!
//! This module defines the error type, its classification, and the result type alias
//! used throughout the crate.

use std::io;
use thiserror::Error;

/// Coarse classification used by the managers to decide how a failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed address string or option; fatal at startup
    Address,
    /// Fetched content cannot be parsed or has an unknown content type
    Structural,
    /// Network or file I/O failure, assumed transient
    Transport,
    /// The target rejected a configuration
    Rejected,
    /// Anything else
    Other,
}

/// Config courier error type
#[derive(Error, Debug)]
pub enum ConfigureError {
    /// The address string could not be parsed
    #[error("Malformed configuration address: {0}")]
    Address(String),

    /// The address names a scheme no source is registered for
    #[error("Configuration scheme {0} is not defined")]
    UnknownScheme(String),

    /// The address has the wrong number of path segments for its scheme
    #[error("Configuration address for {scheme} has {found} path segments; expected format is \"{expected}\"")]
    PathSegments {
        /// Scheme being resolved
        scheme: String,
        /// Segment count found
        found: usize,
        /// Human readable address template
        expected: &'static str,
    },

    /// A segment used as a file name contains illegal characters
    #[error("Name {0:?} contains illegal characters")]
    IllegalName(String),

    /// A numeric argument could not be parsed
    #[error("Argument {name} is not a number: {value}")]
    InvalidNumber {
        /// Argument name
        name: String,
        /// Raw argument value
        value: String,
    },

    /// Unknown serialization format
    #[error("Configuration format {0} is not implemented")]
    UnknownFormat(String),

    /// Startup configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A response declared a content type with no parser mapped to it
    #[error("Content type {0} is not mapped to a known parser")]
    ContentType(String),

    /// A response body was well formed but not of the expected shape
    #[error("Invalid response format: {0}")]
    ResponseFormat(String),

    /// A remote endpoint returned a non-success status
    #[error("Request to {url} returned status {status}")]
    Status {
        /// Requested address
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A cloud service client failed
    #[error("Service error: {0}")]
    Service(String),

    /// A secret could not be resolved
    #[error("Secret {0} is not defined")]
    SecretNotDefined(String),

    /// The target rejected a configuration
    #[error("Configuration rejected: {0}")]
    Rejected(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl ConfigureError {
    /// Classify the error for the manager's handling policy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Address(_)
            | Self::UnknownScheme(_)
            | Self::PathSegments { .. }
            | Self::IllegalName(_)
            | Self::InvalidNumber { .. }
            | Self::UnknownFormat(_)
            | Self::Config(_)
            | Self::SecretNotDefined(_) => ErrorKind::Address,

            Self::Parse(_) | Self::ContentType(_) | Self::ResponseFormat(_) => ErrorKind::Structural,

            Self::Status { .. } | Self::Io(_) | Self::Http(_) | Self::Service(_) => ErrorKind::Transport,

            Self::Rejected(_) => ErrorKind::Rejected,

            Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for ConfigureError {
    fn from(err: serde_json::Error) -> Self {
        ConfigureError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigureError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigureError::Parse(err.to_string())
    }
}

impl From<config::ConfigError> for ConfigureError {
    fn from(err: config::ConfigError) -> Self {
        ConfigureError::Config(err.to_string())
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `ConfigureError`.
pub type Result<T> = std::result::Result<T, ConfigureError>;

/// Error returned by a target that rejects a configuration
pub type TargetError = Box<dyn std::error::Error + Send + Sync>;
