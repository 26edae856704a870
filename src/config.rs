//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\listen-tracker\config.toml
//! - macOS: ~/Library/Application Support/listen-tracker/config.toml
//! - Linux: ~/.config/listen-tracker/config.toml
//!
//! The config file is human-readable and editable. Every section is
//! optional; a missing key simply leaves the dependent provider
//! unavailable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Key for the Last.fm API key
pub const LASTFM_API_KEY: &str = "lastfm_api_key";
/// Key for the Spotify bearer token
pub const SPOTIFY_ACCESS_TOKEN: &str = "spotify_access_token";
/// Flag gating the preview-upload analysis path
pub const EXTENDED_AUDIO_ANALYSIS: &str = "extended_audio_analysis";

/// Read-only key lookup used by the enrichment layer.
///
/// Never fails: absent or blank values read as `None` / `false`.
pub trait ConfigLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn flag(&self, key: &str) -> bool;
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Optional, more expensive behaviour
    pub features: FeatureFlags,

    /// Batch and retry tuning
    pub enrichment: EnrichmentSettings,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Last.fm API key for tags and artist images
    pub lastfm_api_key: Option<String>,

    /// Spotify Web API bearer token; absent means "not connected"
    pub spotify_access_token: Option<String>,
}

/// Feature flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Upload preview clips to ReccoBeats for analysis when a lookup by
    /// Spotify id finds nothing
    pub extended_audio_analysis: bool,
}

/// Enrichment tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Records processed per batch command
    pub batch_size: usize,

    /// FAILED records stop being retried after this many attempts
    pub max_retries: i64,

    /// Minimum age of the last attempt before a FAILED record is retried
    pub retry_after_secs: u64,

    /// ENRICHED records older than this are refreshed
    pub stale_after_days: i64,

    /// Pause between artists during artist resolution
    pub artist_delay_ms: u64,

    /// Per-request HTTP timeout
    pub http_timeout_secs: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_retries: 5,
            retry_after_secs: 6 * 60 * 60,
            stale_after_days: 30,
            artist_delay_ms: 250,
            http_timeout_secs: 20,
        }
    }
}

impl EnrichmentSettings {
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }

    pub fn artist_delay(&self) -> Duration {
        Duration::from_millis(self.artist_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::days(self.stale_after_days.max(0))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ConfigLookup for Config {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            LASTFM_API_KEY => non_blank(&self.credentials.lastfm_api_key),
            SPOTIFY_ACCESS_TOKEN => non_blank(&self.credentials.spotify_access_token),
            _ => None,
        }
    }

    fn flag(&self, key: &str) -> bool {
        match key {
            EXTENDED_AUDIO_ANALYSIS => self.features.extended_audio_analysis,
            _ => false,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("listen-tracker"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path, with the same fallbacks as [`load`].
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to disk
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to an explicit path (atomic write).
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::config(e.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
