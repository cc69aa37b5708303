//! Configuration loading for the Glyphcast client.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub intervals: PollIntervals,
    pub search: SearchConfig,
    pub fingerprint_path: PathBuf,
}

/// Credentials for agent-authenticated endpoints. Anonymous operation
/// (browsing, voting, search) needs no key.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

/// Fixed poll cadences, in milliseconds. Each cache key is refreshed on its
/// own interval; the interval itself throttles retry after a failed tick.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollIntervals {
    pub summaries_ms: u64,
    pub detail_ms: u64,
    pub leaderboard_ms: u64,
    pub chat_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or GLYPHCAST_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.intervals.summaries_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intervals.summaries_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.intervals.detail_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intervals.detail_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.intervals.leaderboard_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intervals.leaderboard_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.intervals.chat_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "intervals.chat_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.search.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.debounce_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.search.limit == 0 || self.search.limit > 50 {
            return Err(ConfigError::InvalidValue {
                field: "search.limit",
                reason: "must be in 1..=50".to_string(),
            });
        }
        if self.fingerprint_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fingerprint_path",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(key) = &self.auth.api_key {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "auth.api_key",
                    reason: "must not be empty when present".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("GLYPHCAST_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
