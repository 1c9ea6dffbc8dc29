//! Config Courier Command Line Tool
//!
//! Follows a configuration address and prints every configuration it delivers. Handy for
//! checking an address before wiring it into a service.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::Notify;

use config_courier::common::{init_logger, ConfigureError, Result, TargetError};
use config_courier::config::defaults::{
    CACHE_DIR_ENV, CONFIGURATION_ENV, CONFIG_ENV, SECRETS_ENV,
};
use config_courier::config::{
    ConfigManagerFactory, ConfigTarget, ConfigValue, ManagerState, Settings,
};
use config_courier::secret::SecretProviderFactory;
use config_courier::{APP_NAME, VERSION};

/// Config Courier: pull-based configuration delivery
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Configuration address, e.g. debug:/etc/app/config.json
    #[arg(long, env = CONFIGURATION_ENV)]
    config: Option<String>,

    /// Secret provider address, e.g. docker:app_secrets
    #[arg(long, env = SECRETS_ENV)]
    secrets: Option<String>,

    /// Directory for cached responses
    #[arg(long, env = CACHE_DIR_ENV)]
    cache: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Prints each configuration to stdout
#[derive(Default)]
struct StdoutTarget {
    shutdown: Notify,
}

#[async_trait]
impl ConfigTarget for StdoutTarget {
    async fn apply(&self, config: ConfigValue) -> std::result::Result<(), TargetError> {
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }

    fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level);

    info!("Starting {} v{}", APP_NAME, VERSION);

    let mut settings = Settings::from_env()?;
    if args.cache.is_some() {
        settings.configuration_cache = args.cache.clone();
    }

    let address = match args.config.as_deref().or(settings.address()) {
        Some(address) => address.to_string(),
        None => {
            return Err(ConfigureError::Config(format!(
                "No configuration address; use --config or set {} or {}",
                CONFIGURATION_ENV, CONFIG_ENV
            )))
        }
    };

    let secrets = SecretProviderFactory::new().create_from_string(args.secrets.as_deref())?;
    let factory = ConfigManagerFactory::new()
        .with_settings(settings)
        .with_secret_provider(secrets);

    let target = Arc::new(StdoutTarget::default());
    let mut manager = factory.create_from_string(&address, target.clone())?;

    manager.start().await;

    if manager.is_immutable() {
        // Nothing more will arrive
        return match manager.state() {
            ManagerState::Applied => Ok(()),
            state => Err(ConfigureError::Other(format!("Configuration not applied ({})", state))),
        };
    }

    info!("Following configuration, press Ctrl+C to stop");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Unable to listen for Ctrl+C: {}", e);
            }
            info!("Stopping");
        }
        _ = target.shutdown.notified() => {
            warn!("Shutdown requested by configuration manager");
        }
    }

    manager.stop().await;

    Ok(())
}
