//! Configuration module
//!
//! This module handles configuration delivery: parsing source addresses, fetching
//! configurations from the different sources, detecting changes, and driving them into a
//! target on a schedule.

// Submodules
pub mod address;
pub mod cache;
pub mod defaults;
pub mod factory;
pub mod manager;
pub mod settings;
pub mod source;
pub mod target;
pub mod value;

// Re-export types and traits
pub use self::address::SourceAddress;
pub use self::cache::{CachedResponse, ResponseCache};
pub use self::factory::ConfigManagerFactory;
pub use self::manager::{
    ConfigManager, ImmutableConfigManager, ManagerState, PollingConfigManager, Schedule,
};
pub use self::settings::Settings;
pub use self::source::{
    AlarmNotifier, AppConfigClient, AppConfigSource, ConfigSource, FailureCause, FileSource,
    HttpSource, LatestConfiguration, ManagedSource, SecretFileSource, SessionRequest, Source,
    SourceType,
};
pub use self::target::ConfigTarget;
pub use self::value::{ConfigFormat, ConfigValue, Fingerprint};
