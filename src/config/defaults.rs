//! Default configuration values
//!
//! Single source of truth for environment variable names, poll intervals, and the other
//! constants the factory and sources agree on.

use std::path::PathBuf;
use std::time::Duration;

/// Primary environment variable holding the configuration address
pub const CONFIGURATION_ENV: &str = "CONFIGURATION";

/// Fallback environment variable holding the configuration address
pub const CONFIG_ENV: &str = "CONFIG";

/// Environment variable naming the response cache directory
pub const CACHE_DIR_ENV: &str = "CONFIGURATION_CACHE";

/// Environment variable holding the secret provider address
pub const SECRETS_ENV: &str = "SECRETS";

/// Directory docker mounts secrets into
pub const DOCKER_SECRETS_DIR: &str = "/run/secrets";

/// User agent sent with every request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Cache file extension
pub const CACHE_EXTENSION: &str = "dat";

/// Code reported when the target rejects a configuration
pub const APPLY_FAILURE_CODE: &str = "EX";

/// Code reported when a configuration cannot be reloaded
pub const RELOAD_FAILURE_CODE: &str = "RE";

/// Code reported when fetched content is not usable
pub const INVALID_CONTENT_CODE: &str = "invalid-json";

/// Content type assumed when an endpoint sends none
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Poll interval for `http`/`https` addresses (seconds)
pub const HTTP_POLL_SECONDS: u64 = 300;

/// Poll interval for `debug` addresses (seconds)
pub const DEBUG_POLL_SECONDS: u64 = 15;

/// Poll interval for `file` addresses (seconds)
pub const FILE_POLL_SECONDS: u64 = 300;

/// Poll interval for managed addresses (seconds)
pub const MANAGED_POLL_SECONDS: u64 = 300;

/// Poll interval for app-config addresses (seconds)
pub const APPCONFIG_POLL_SECONDS: u64 = 300;

/// Slack kept between the app-config session minimum and our own poll interval (seconds)
pub const APPCONFIG_SLACK_SECONDS: u64 = 15;

/// Smallest app-config poll interval we accept (seconds)
pub const APPCONFIG_MIN_POLL_SECONDS: u64 = 30;

/// Wait between cold-start attempts of the managed source
pub fn startup_retry() -> Duration {
    Duration::from_secs(15)
}

/// Default docker secrets directory
pub fn docker_secrets_dir() -> PathBuf {
    PathBuf::from(DOCKER_SECRETS_DIR)
}

/// Timeout for a single HTTP request
pub fn request_timeout() -> Duration {
    Duration::from_secs(30)
}
