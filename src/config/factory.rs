//! Configuration manager factory
//!
//! Turns an address string into a source and a manager. All validation happens here, so
//! a bad address fails before anything touches the network or the file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::common::{fs, ConfigureError, Result};
use crate::config::address::SourceAddress;
use crate::config::cache::ResponseCache;
use crate::config::defaults::{
    docker_secrets_dir, APPCONFIG_MIN_POLL_SECONDS, APPCONFIG_POLL_SECONDS,
    APPCONFIG_SLACK_SECONDS, DEBUG_POLL_SECONDS, FILE_POLL_SECONDS, HTTP_POLL_SECONDS,
    MANAGED_POLL_SECONDS,
};
use crate::config::manager::{ConfigManager, ImmutableConfigManager, PollingConfigManager, Schedule};
use crate::config::settings::Settings;
use crate::config::source::{
    AlarmNotifier, AppConfigClient, AppConfigSource, FileSource, HttpSource, ManagedSource,
    SecretFileSource, SessionRequest, Source,
};
use crate::config::target::ConfigTarget;
use crate::config::value::ConfigFormat;
use crate::secret::{
    AtIdSecretReplacer, NullSecretProvider, SecretProvider, SecretProviderFactory, SecretReplacer,
};

/// Argument selecting the document format
const FORMAT_ARGUMENT: &str = "format";

/// Argument overriding the poll interval, in seconds
const POLL_TIME_ARGUMENT: &str = "pollTime";

/// Argument naming the alarm raised on failure
const ALARM_ARGUMENT: &str = "alarm";

/// Builds configuration managers from address strings
///
/// | scheme | source | schedule |
/// |---|---|---|
/// | `http`, `https` | [`HttpSource`] | every 300 s, `pollTime` |
/// | `debug:<path>` | [`FileSource`] | every 15 s |
/// | `file:<path>` | [`FileSource`] | every 300 s |
/// | `docker:<name>` | [`SecretFileSource`] | once |
/// | `aws:appconfig/<app>/<cfg>/<env>` | [`AppConfigSource`] | every 300 s, `pollTime`, at least 30 s |
/// | `managed:<host>/<token>` | [`ManagedSource`] | every 300 s, `pollTime` |
#[derive(Clone)]
pub struct ConfigManagerFactory {
    settings: Settings,
    secrets: Arc<dyn SecretProvider>,
    secrets_dir: PathBuf,
    app_config: Option<Arc<dyn AppConfigClient>>,
    alarms: Option<Arc<dyn AlarmNotifier>>,
    http_client: Option<reqwest::Client>,
}

impl Default for ConfigManagerFactory {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            secrets: Arc::new(NullSecretProvider),
            secrets_dir: docker_secrets_dir(),
            app_config: None,
            alarms: None,
            http_client: None,
        }
    }
}

impl ConfigManagerFactory {
    /// Create a factory with no settings, no secrets and no cloud clients
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory from the process environment
    ///
    /// Reads the cache directory and secret provider address from the environment.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::from_env()?;
        let secrets = SecretProviderFactory::new().from_settings(&settings)?;

        Ok(Self::new().with_settings(settings).with_secret_provider(secrets))
    }

    /// Use explicit settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Resolve `@name` references through `provider`
    pub fn with_secret_provider(mut self, provider: Arc<dyn SecretProvider>) -> Self {
        self.secrets = provider;
        self
    }

    /// Look for docker secrets in `dir`
    pub fn with_secrets_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.secrets_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Client used for `aws:appconfig` addresses
    pub fn with_app_config_client(mut self, client: Arc<dyn AppConfigClient>) -> Self {
        self.app_config = Some(client);
        self
    }

    /// Notifier used for the `alarm` argument
    pub fn with_alarm_notifier(mut self, notifier: Arc<dyn AlarmNotifier>) -> Self {
        self.alarms = Some(notifier);
        self
    }

    /// Share one HTTP client between all HTTP sources
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Settings in use
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create a manager for the address in `CONFIGURATION`, or `CONFIG` when that is unset
    ///
    /// The environment is read at call time.
    pub fn create_from_environment(&self, target: Arc<dyn ConfigTarget>) -> Result<ConfigManager> {
        let settings = Settings::from_env()?;
        let address = settings.address().ok_or_else(|| {
            ConfigureError::Config("CONFIGURATION environment variable is not defined".to_string())
        })?;

        self.create_from_string(address, target)
    }

    /// Create a manager for an address string
    pub fn create_from_string(
        &self,
        address: &str,
        target: Arc<dyn ConfigTarget>,
    ) -> Result<ConfigManager> {
        let (source, schedule) = self.create_source(address)?;

        let manager = match schedule {
            Schedule::Once => ImmutableConfigManager::new(Box::new(source), target).into(),
            Schedule::Every(interval) => {
                PollingConfigManager::new(Box::new(source), target, interval).into()
            }
        };

        Ok(manager)
    }

    /// Resolve an address to a source and the schedule it should be driven on
    pub fn create_source(&self, address: &str) -> Result<(Source, Schedule)> {
        let address = SourceAddress::parse(address)?;
        debug!("Resolving configuration address with scheme {}", address.scheme());

        match address.scheme() {
            "http" | "https" => self.create_http(&address),
            "debug" => self.create_file(&address, DEBUG_POLL_SECONDS),
            "file" => self.create_file(&address, FILE_POLL_SECONDS),
            "docker" => self.create_docker(&address),
            "aws" => self.create_app_config(&address),
            "managed" | "smbtrack" => self.create_managed(&address),
            scheme => Err(ConfigureError::UnknownScheme(scheme.to_string())),
        }
    }

    fn create_http(&self, address: &SourceAddress) -> Result<(Source, Schedule)> {
        let url = address.without_local();
        let interval = poll_interval(address, HTTP_POLL_SECONDS)?;
        let cache = self.cache_dir().map(|dir| ResponseCache::for_key(dir, url));

        let source = match &self.http_client {
            Some(client) => HttpSource::with_client(client.clone(), url, cache)?,
            None => HttpSource::new(url, cache)?,
        };

        Ok((Source::Http(source), Schedule::Every(interval)))
    }

    fn create_file(&self, address: &SourceAddress, seconds: u64) -> Result<(Source, Schedule)> {
        if address.segment_count() == 0 {
            return Err(ConfigureError::PathSegments {
                scheme: address.scheme().to_string(),
                found: 0,
                expected: "file:<path>",
            });
        }

        let format = format_of(address, address.last_segment().unwrap_or_default())?;

        Ok((
            Source::File(FileSource::new(address.path_as_local(), format)),
            Schedule::Every(Duration::from_secs(seconds)),
        ))
    }

    fn create_docker(&self, address: &SourceAddress) -> Result<(Source, Schedule)> {
        let name = match address.segments() {
            [name] => name,
            segments => {
                return Err(ConfigureError::PathSegments {
                    scheme: "docker".to_string(),
                    found: segments.len(),
                    expected: "docker:<secret>",
                })
            }
        };

        if !fs::is_valid_file_name(name) {
            return Err(ConfigureError::IllegalName(name.clone()));
        }

        let format = format_of(address, name)?;
        let source = SecretFileSource::new(self.secrets_dir.join(name), format)?;

        Ok((Source::SecretFile(source), Schedule::Once))
    }

    fn create_app_config(&self, address: &SourceAddress) -> Result<(Source, Schedule)> {
        let (service, application, configuration, environment) = match address.segments() {
            // Anything after the environment is ignored
            [service, application, configuration, environment, ..] => {
                (service, application, configuration, environment)
            }
            segments => {
                return Err(ConfigureError::PathSegments {
                    scheme: "aws".to_string(),
                    found: segments.len(),
                    expected: "aws:appconfig/<application>/<configuration>/<environment>",
                })
            }
        };

        if service != "appconfig" {
            return Err(ConfigureError::Config(format!(
                "AWS configuration service {} is not supported",
                service
            )));
        }

        // The service wants a minimum poll interval of its own; keep some slack below ours
        let seconds = address
            .numeric_argument(POLL_TIME_ARGUMENT)?
            .unwrap_or(APPCONFIG_POLL_SECONDS)
            .max(APPCONFIG_MIN_POLL_SECONDS);

        let client = self.app_config.clone().ok_or_else(|| {
            ConfigureError::Config("No AppConfig client is registered".to_string())
        })?;

        let request = SessionRequest {
            application: application.clone(),
            configuration: configuration.clone(),
            environment: environment.clone(),
            minimum_poll_interval: Duration::from_secs(seconds - APPCONFIG_SLACK_SECONDS),
        };

        let mut source = AppConfigSource::new(client, request);
        if let Some(alarm) = address.argument(ALARM_ARGUMENT) {
            let notifier = self.alarms.clone().ok_or_else(|| {
                ConfigureError::Config(format!(
                    "Alarm {} requested but no alarm notifier is registered",
                    alarm
                ))
            })?;
            source = source.with_alarm(alarm, notifier);
        }

        Ok((Source::AppConfig(source), Schedule::Every(Duration::from_secs(seconds))))
    }

    fn create_managed(&self, address: &SourceAddress) -> Result<(Source, Schedule)> {
        let (host, token) = match address.segments() {
            [host, token] => (host, token),
            segments => {
                return Err(ConfigureError::PathSegments {
                    scheme: address.scheme().to_string(),
                    found: segments.len(),
                    expected: "managed:<host>/<token>",
                })
            }
        };

        let interval = poll_interval(address, MANAGED_POLL_SECONDS)?;

        let replacer = AtIdSecretReplacer::new(self.secrets.clone());
        let host = replacer.replace(host)?;
        let token = replacer.replace(token)?;

        info!("Using managed configuration from {}", host);
        let source = ManagedSource::new(&host, &token, self.cache_dir())?;

        Ok((Source::Managed(source), Schedule::Every(interval)))
    }

    fn cache_dir(&self) -> Option<&Path> {
        self.settings.configuration_cache.as_deref()
    }
}

/// `pollTime` argument, or the scheme's default
fn poll_interval(address: &SourceAddress, default_seconds: u64) -> Result<Duration> {
    let seconds = address
        .numeric_argument(POLL_TIME_ARGUMENT)?
        .unwrap_or(default_seconds);
    Ok(Duration::from_secs(seconds))
}

/// `format` argument, else the name's extension, else JSON
fn format_of(address: &SourceAddress, name: &str) -> Result<ConfigFormat> {
    match address.argument(FORMAT_ARGUMENT) {
        Some(format) => format.parse(),
        None => Ok(ConfigFormat::from_extension(name).unwrap_or_default()),
    }
}
