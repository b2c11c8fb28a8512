//! Monitor configuration.
//!
//! Read from a TOML file: `--config`, else `AUS_EMERGENCY_CONFIG`, else
//! `aus_emergency.toml` in the working directory. A missing default file
//! means "use the defaults"; a missing explicit file is an error.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aus_emergency_coordinator::BackoffPolicy;
use aus_emergency_incident_models::{AustralianState, Zone};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aus_emergency.toml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "AUS_EMERGENCY_CONFIG";

/// Default poll interval in seconds.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 600;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Config path (or `<inline>`).
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The values parsed but are not usable.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// One monitored state, with optional per-entry overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    /// State code (`SA`, `NSW`, `VIC`, `QLD`, `TAS`, `WA`).
    pub state: AustralianState,
    /// Poll interval override, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u64>,
    /// Stale-removal override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_stale: Option<bool>,
}

impl EntryConfig {
    /// Entry for `state` using the global settings.
    #[must_use]
    pub const fn new(state: AustralianState) -> Self {
        Self {
            state,
            update_interval: None,
            remove_stale: None,
        }
    }
}

/// Effective settings for one entry after applying global defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntrySettings {
    /// Monitored state.
    pub state: AustralianState,
    /// Poll interval while healthy.
    #[serde(serialize_with = "serialize_secs")]
    pub update_interval: Duration,
    /// Delete (rather than mark unavailable) records missing from a poll.
    pub remove_stale: bool,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Default poll interval, in seconds.
    pub update_interval: u64,
    /// Default stale-removal policy.
    pub remove_stale: bool,
    /// Backoff tuning shared by every coordinator.
    pub backoff: BackoffPolicy,
    /// Monitored states.
    pub entries: Vec<EntryConfig>,
    /// Monitored zones.
    pub zones: Vec<Zone>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            remove_stale: false,
            backoff: BackoffPolicy::default(),
            entries: vec![EntryConfig::new(AustralianState::Sa)],
            zones: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Self::parse(toml_str, Path::new("<inline>"))
    }

    fn parse(toml_str: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration.
    ///
    /// `explicit` (from `--config`) wins over [`CONFIG_ENV_VAR`], which
    /// wins over [`DEFAULT_CONFIG_FILE`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file is missing, or
    /// any file that exists is unreadable or invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let path = match named {
            Some(path) => path,
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    log::info!("No {DEFAULT_CONFIG_FILE} found, using default configuration");
                    return Ok(Self::default());
                }
                path
            }
        };

        log::info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text, &path)
    }

    /// Checks value ranges and uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if self.update_interval == 0 {
            return invalid("update_interval must be positive".to_string());
        }
        if self.backoff.base_retry_delay == 0 || self.backoff.max_delay == 0 {
            return invalid("backoff delays must be positive".to_string());
        }
        if self.backoff.multiplier == 0 {
            return invalid("backoff multiplier must be positive".to_string());
        }
        if self.entries.is_empty() {
            return invalid("at least one entry is required".to_string());
        }

        let mut states = BTreeSet::new();
        for entry in &self.entries {
            if !states.insert(entry.state) {
                return invalid(format!("state {} is configured more than once", entry.state));
            }
            if entry.update_interval == Some(0) {
                return invalid(format!("update_interval for {} must be positive", entry.state));
            }
        }

        let mut names = BTreeSet::new();
        for zone in &self.zones {
            if !zone.radius.is_finite() || zone.radius < 0.0 {
                return invalid(format!("zone {:?} has an invalid radius", zone.name));
            }
            if !zone.latitude.is_finite() || !zone.longitude.is_finite() {
                return invalid(format!("zone {:?} has invalid coordinates", zone.name));
            }
            if !names.insert(zone.name.as_str()) {
                return invalid(format!("zone {:?} is configured more than once", zone.name));
            }
        }

        Ok(())
    }

    /// Effective per-entry settings, in configuration order.
    #[must_use]
    pub fn settings(&self) -> Vec<EntrySettings> {
        self.entries
            .iter()
            .map(|entry| EntrySettings {
                state: entry.state,
                update_interval: Duration::from_secs(
                    entry.update_interval.unwrap_or(self.update_interval),
                ),
                remove_stale: entry.remove_stale.unwrap_or(self.remove_stale),
            })
            .collect()
    }

    /// Settings for `state`, if it is configured.
    #[must_use]
    pub fn settings_for(&self, state: AustralianState) -> Option<EntrySettings> {
        self.settings().into_iter().find(|s| s.state == state)
    }
}
