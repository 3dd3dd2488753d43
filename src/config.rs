use crate::common::get_data_dir;
use crate::error::{Result, VoicekeeperError};
use crate::models::ChannelId;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest history bound we accept; anything lower would make the event
/// log useless for the history queries.
const MIN_MAX_HISTORY: usize = 50;

/// Main configuration structure for voicekeeper
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Authentication token for the platform gateway. May be a literal
    /// token or an environment variable reference (`${VAR}` / `$VAR`).
    pub token: String,

    /// Presence tracking configuration
    pub tracker: TrackerConfig,

    /// Stay reconciler configuration
    pub reconciler: ReconcilerConfig,

    /// Durable store configuration
    pub store: StoreConfig,
}

/// Presence tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Prefix the platform command layer listens for
    pub command_prefix: String,

    /// Maximum number of history lines kept (oldest dropped first)
    pub max_history: usize,

    /// Channel id that receives join/leave/move notices (0 = disabled)
    pub log_channel: ChannelId,
}

/// Stay reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Seconds between reconciliation passes
    pub interval_seconds: u64,

    /// Backoff sleep after a failed pass, in seconds
    pub retry_delay_seconds: u64,
}

/// Durable store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory for persisted documents; empty selects the platform
    /// data dir (`~/.local/share/voicekeeper`)
    pub data_dir: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            command_prefix: "!".to_string(),
            max_history: 800,
            log_channel: 0,
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            interval_seconds: 30,
            retry_delay_seconds: 10,
        }
    }
}

impl StoreConfig {
    /// Effective data directory (XDG default when unset).
    pub fn data_dir_path(&self) -> PathBuf {
        if self.data_dir.is_empty() {
            get_data_dir()
        } else {
            PathBuf::from(&self.data_dir)
        }
    }
}

// Configuration loading
impl Config {
    /// Load configuration from file (or defaults), then apply environment
    /// overrides and sanity clamps. No global config instance exists; the
    /// loaded value is passed explicitly to whoever needs it.
    pub fn load() -> Result<Self> {
        let mut config = if let Some(config_path) = Self::find_config_file() {
            Self::load_from_file(&config_path)?
        } else {
            // No config file found, use defaults
            Config::default()
        };

        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    /// Load configuration from a specific file (no env overrides applied)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| VoicekeeperError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| VoicekeeperError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| VoicekeeperError::Config(format!("Failed to serialize config: {}", e)))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VoicekeeperError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, toml_string)
            .map_err(|e| VoicekeeperError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Find config file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order of priority:
        // 1. Environment variable
        if let Ok(path) = env::var("VOICEKEEPER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("voicekeeper").join("config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Home directory
        if let Some(home_dir) = dirs::home_dir() {
            let path = home_dir.join(".voicekeeper.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Get default config file path (for creating new config)
    pub fn default_config_path() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("voicekeeper").join("config.toml"))
        } else {
            Err(VoicekeeperError::Config(
                "Could not determine config directory".into(),
            ))
        }
    }

    /// Apply `VOICEKEEPER_*` environment overrides on top of the file values.
    /// Invalid numeric values are warned about and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("VOICEKEEPER_TOKEN") {
            self.token = token;
        }
        if let Ok(prefix) = env::var("VOICEKEEPER_PREFIX") {
            self.tracker.command_prefix = prefix;
        }
        if let Ok(dir) = env::var("VOICEKEEPER_DATA_DIR") {
            self.store.data_dir = dir;
        }
        if let Ok(value) = env::var("VOICEKEEPER_LOG_CHANNEL") {
            match value.parse::<ChannelId>() {
                Ok(id) => self.tracker.log_channel = id,
                Err(_) => warn!("Ignoring invalid VOICEKEEPER_LOG_CHANNEL: {}", value),
            }
        }
        if let Ok(value) = env::var("VOICEKEEPER_MAX_HISTORY") {
            match value.parse::<usize>() {
                Ok(n) => self.tracker.max_history = n,
                Err(_) => warn!("Ignoring invalid VOICEKEEPER_MAX_HISTORY: {}", value),
            }
        }
        if let Ok(value) = env::var("VOICEKEEPER_RECONCILE_INTERVAL") {
            match value.parse::<u64>() {
                Ok(n) => self.reconciler.interval_seconds = n,
                Err(_) => warn!("Ignoring invalid VOICEKEEPER_RECONCILE_INTERVAL: {}", value),
            }
        }
        if let Ok(value) = env::var("VOICEKEEPER_RETRY_DELAY") {
            match value.parse::<u64>() {
                Ok(n) => self.reconciler.retry_delay_seconds = n,
                Err(_) => warn!("Ignoring invalid VOICEKEEPER_RETRY_DELAY: {}", value),
            }
        }
    }

    /// Clamp values the rest of the system assumes are sane.
    pub fn normalize(&mut self) {
        if self.tracker.max_history < MIN_MAX_HISTORY {
            warn!(
                "max_history {} is below the minimum, using {}",
                self.tracker.max_history, MIN_MAX_HISTORY
            );
            self.tracker.max_history = MIN_MAX_HISTORY;
        }
        if self.reconciler.interval_seconds == 0 {
            warn!("reconciler interval of 0s is not allowed, using 1s");
            self.reconciler.interval_seconds = 1;
        }
    }

    /// Resolve the gateway token, handling environment variable references.
    /// Supports both ${VAR} and $VAR syntax. An unset or empty token is a
    /// fatal configuration error: bootstrap must not proceed without one.
    pub fn resolve_token(&self) -> Result<String> {
        let raw = self.token.trim();
        if raw.is_empty() {
            return Err(VoicekeeperError::config(
                "authentication token is not set (config 'token' or VOICEKEEPER_TOKEN)",
            ));
        }

        let resolved = if raw.starts_with("${") && raw.ends_with('}') {
            // Extract variable name: ${VAR_NAME} -> VAR_NAME
            let var_name = &raw[2..raw.len() - 1];
            env::var(var_name).map_err(|_| {
                VoicekeeperError::Config(format!("Environment variable {} not found", var_name))
            })?
        } else if let Some(var_name) = raw.strip_prefix('$') {
            env::var(var_name).map_err(|_| {
                VoicekeeperError::Config(format!("Environment variable {} not found", var_name))
            })?
        } else {
            // Use token directly
            raw.to_string()
        };

        if resolved.trim().is_empty() {
            return Err(VoicekeeperError::config(
                "authentication token resolved to an empty string",
            ));
        }
        Ok(resolved)
    }

    /// Generate example config file content
    pub fn example_toml() -> &'static str {
        r#"# Voicekeeper Configuration File
#
# This file configures the voice presence tracker.
# All values shown are the defaults - you can override only what you need.

# Authentication token for the platform gateway.
# May be a literal token or an environment variable reference.
token = "${VOICEKEEPER_TOKEN}"

[tracker]
# Prefix the platform command layer listens for
command_prefix = "!"

# Maximum number of history lines kept (oldest are dropped first)
max_history = 800

# Channel id that receives join/leave/move notices (0 = disabled)
log_channel = 0

[reconciler]
# Seconds between stay reconciliation passes
interval_seconds = 30

# Backoff after a failed pass, in seconds
retry_delay_seconds = 10

[store]
# Data directory for persisted documents.
# Empty selects the platform data dir (~/.local/share/voicekeeper).
data_dir = ""
"#
    }
}
