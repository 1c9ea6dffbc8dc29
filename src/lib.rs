//! Config Courier: pull-based configuration delivery
//!
//! This library delivers configuration data from a pluggable source to a running process,
//! keeps it current by polling, and reports back to the source whether each configuration
//! was accepted. Sources that support it (the managed service, the cloud app-config
//! service) use those reports to drive staged rollouts and automatic rollback.
//!
//! # Main Features
//!
//! - One address string selects the source: `http(s)`, `debug`, `file`, `docker`,
//!   `aws:appconfig`, `managed`
//! - JSON and YAML documents
//! - Change detection by content fingerprint, so identical documents are applied once
//! - On-disk cache of the last good response for cold starts
//! - `@name` secret references in addresses
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use config_courier::common::TargetError;
//! use config_courier::config::{ConfigManagerFactory, ConfigTarget, ConfigValue};
//!
//! struct Service;
//!
//! #[async_trait]
//! impl ConfigTarget for Service {
//!     async fn apply(&self, config: ConfigValue) -> Result<(), TargetError> {
//!         println!("new configuration: {}", config);
//!         Ok(())
//!     }
//!
//!     fn shutdown(&self) {
//!         std::process::exit(1);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> config_courier::Result<()> {
//!     let factory = ConfigManagerFactory::from_env()?;
//!     let mut manager = factory.create_from_environment(Arc::new(Service))?;
//!
//!     manager.start().await;
//!     tokio::signal::ctrl_c().await?;
//!     manager.stop().await;
//!
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod secret;

// Re-export commonly used structures and functions for convenience
pub use common::{ConfigureError, ErrorKind, Result};
pub use config::{ConfigManager, ConfigManagerFactory, ConfigTarget, ConfigValue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
