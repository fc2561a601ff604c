//! Configuration parsed from environment variables.
//!
//! Client side (local storage + sync):
//! - `KEEPSAKE_MODE`: `development` (default) or `production`; sync runs only in production
//! - `KEEPSAKE_REMOTE_URL`: base URL of the remote store, default `http://127.0.0.1:3000/api`
//! - `KEEPSAKE_SYNC_TIMEOUT_MS`: per remote call, default 5000
//! - `KEEPSAKE_SYNC_RETRIES`: worker attempts per field, default 3
//! - `KEEPSAKE_SYNC_RETRY_BASE_MS`: worker back-off base, default 250
//! - `KEEPSAKE_SYNC_QUEUE_CAPACITY`: default 256
//! - `KEEPSAKE_STORAGE`: `auto` (default), `durable`, `session`, `memory`
//! - `KEEPSAKE_DATA_DIR`: durable medium directory, default `.keepsake`
//! - `KEEPSAKE_MEMORY_SLOTS`: default 10
//!
//! Server side:
//! - `PORT`: default 3000
//! - `KEEPSAKE_DATA_FILE`: default `data/website-data.json`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SYNC_RETRIES: usize = 3;
pub const DEFAULT_SYNC_RETRY_BASE_MS: u64 = 250;
pub const DEFAULT_SYNC_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_SYNC_DRAIN_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_DATA_DIR: &str = ".keepsake";
pub const DEFAULT_MEMORY_SLOTS: u32 = 10;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_FILE: &str = "data/website-data.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown KEEPSAKE_MODE: {0} (expected 'development' or 'production')")]
    Mode(String),

    #[error("unknown KEEPSAKE_STORAGE: {0} (expected 'auto', 'durable', 'session' or 'memory')")]
    Storage(String),
}

// =============================================================================
// ENUMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    #[must_use]
    pub fn sync_enabled(self) -> bool {
        self == Self::Production
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::Mode(other.to_owned())),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}

/// Which storage tier to try first. Lower tiers remain as fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragePreference {
    #[default]
    Auto,
    Durable,
    Session,
    Memory,
}

impl FromStr for StoragePreference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "durable" => Ok(Self::Durable),
            "session" => Ok(Self::Session),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Storage(other.to_owned())),
        }
    }
}

// =============================================================================
// CLIENT CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub preference: StoragePreference,
    /// Directory of the durable medium's file.
    pub data_dir: PathBuf,
    /// Directory of the session medium's file.
    pub session_dir: PathBuf,
    pub memory_slots: u32,
}

impl StorageConfig {
    #[must_use]
    pub fn new(preference: StoragePreference, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            preference,
            data_dir: data_dir.into(),
            session_dir: std::env::temp_dir(),
            memory_slots: DEFAULT_MEMORY_SLOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub enabled: bool,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub enabled: bool,
    /// Bound on every remote call made by the coordinator.
    pub timeout: Duration,
    /// Worker attempts per field task (at least one is always made).
    pub retries: usize,
    /// Linear back-off step between worker attempts.
    pub retry_base: Duration,
    pub queue_capacity: usize,
    /// How long shutdown waits for queued tasks before abandoning them.
    pub drain_timeout: Duration,
}

impl SyncSettings {
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::enabled() }
    }

    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_millis(DEFAULT_SYNC_TIMEOUT_MS),
            retries: DEFAULT_SYNC_RETRIES,
            retry_base: Duration::from_millis(DEFAULT_SYNC_RETRY_BASE_MS),
            queue_capacity: DEFAULT_SYNC_QUEUE_CAPACITY,
            drain_timeout: Duration::from_millis(DEFAULT_SYNC_DRAIN_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub mode: DeploymentMode,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub sync: SyncSettings,
}

impl ClientConfig {
    /// Build client config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `KEEPSAKE_MODE` or `KEEPSAKE_STORAGE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build client config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `KEEPSAKE_MODE` or `KEEPSAKE_STORAGE`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = lookup("KEEPSAKE_MODE")
            .map(|raw| raw.parse::<DeploymentMode>())
            .transpose()?
            .unwrap_or_default();
        let preference = lookup("KEEPSAKE_STORAGE")
            .map(|raw| raw.parse::<StoragePreference>())
            .transpose()?
            .unwrap_or_default();

        let mut storage = StorageConfig::new(
            preference,
            lookup("KEEPSAKE_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned()),
        );
        storage.memory_slots = parse_or(&lookup, "KEEPSAKE_MEMORY_SLOTS", DEFAULT_MEMORY_SLOTS);

        let timeout = Duration::from_millis(parse_or(&lookup, "KEEPSAKE_SYNC_TIMEOUT_MS", DEFAULT_SYNC_TIMEOUT_MS));
        let sync = SyncSettings {
            enabled: mode.sync_enabled(),
            timeout,
            retries: parse_or(&lookup, "KEEPSAKE_SYNC_RETRIES", DEFAULT_SYNC_RETRIES),
            retry_base: Duration::from_millis(parse_or(
                &lookup,
                "KEEPSAKE_SYNC_RETRY_BASE_MS",
                DEFAULT_SYNC_RETRY_BASE_MS,
            )),
            queue_capacity: parse_or(&lookup, "KEEPSAKE_SYNC_QUEUE_CAPACITY", DEFAULT_SYNC_QUEUE_CAPACITY),
            drain_timeout: Duration::from_millis(parse_or(
                &lookup,
                "KEEPSAKE_SYNC_DRAIN_MS",
                DEFAULT_SYNC_DRAIN_MS,
            )),
        };

        let remote = RemoteConfig {
            base_url: lookup("KEEPSAKE_REMOTE_URL")
                .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            enabled: mode.sync_enabled(),
            request_timeout: timeout,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { mode, storage, remote, sync })
    }

    /// Switch deployment mode, keeping the remote client and coordinator in step.
    #[must_use]
    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self.remote.enabled = mode.sync_enabled();
        self.sync.enabled = mode.sync_enabled();
        self
    }
}

// =============================================================================
// SERVER CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub data_file: PathBuf,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            data_file: lookup("KEEPSAKE_DATA_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
