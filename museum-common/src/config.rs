//! Configuration loading and config file resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MUSEUM_GUIDE_CONFIG";

/// Application name used when the config does not provide one
pub const DEFAULT_APP_NAME: &str = "大学歴史建築ミュージアム";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive ("info", "debug", "museum_guide=trace", ...)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Request admission limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Callers allowed to use recognition (empty = everyone)
    pub allowed_callers: Vec<String>,
    /// Reverse proxies whose `X-Forwarded-For` header is believed
    /// (empty = the header is ignored)
    pub trusted_proxies: Vec<String>,
    /// Requests per caller per quota window
    pub api_rate_limit: u32,
    /// Requests across all callers per quota window
    pub daily_limit: u32,
    /// Quota window length in seconds
    pub window_seconds: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_callers: Vec::new(),
            trusted_proxies: Vec::new(),
            api_rate_limit: 10,
            daily_limit: 100,
            window_seconds: 86_400,
        }
    }
}

/// Google Cloud credentials and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCloudConfig {
    /// Project billed for API usage (sent as the quota project)
    pub project_id: Option<String>,
    /// API key; when absent every external capability reports unavailable
    pub api_key: Option<String>,
    /// Upper bound on outbound requests per second, per API
    pub requests_per_second: u32,
    /// Text-to-speech voice name for the canonical language
    pub tts_voice: Option<String>,
}

impl Default for GoogleCloudConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            requests_per_second: 5,
            tts_voice: None,
        }
    }
}

/// Museum guide TOML configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub app_name: String,
    /// Mask external service failures with placeholder results
    pub demo_mode: bool,
    /// Language the catalog descriptions are written in
    pub canonical_language: String,
    /// Minimum candidate score for a recognition match
    pub min_match_score: f32,
    /// JSON catalog file; the built-in catalog is used when absent
    pub catalog_path: Option<PathBuf>,
    pub bind_address: String,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub google_cloud: GoogleCloudConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            demo_mode: false,
            canonical_language: "ja".to_string(),
            min_match_score: 0.5,
            catalog_path: None,
            bind_address: "127.0.0.1:5730".to_string(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            google_cloud: GoogleCloudConfig::default(),
        }
    }
}

/// Config file resolution, in priority order:
/// 1. Command-line argument
/// 2. `MUSEUM_GUIDE_CONFIG` environment variable
/// 3. `<user config dir>/museum-guide/config.toml` (only if it exists)
///
/// Returns `None` when no source names a file, meaning compiled defaults apply.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Platform config location (`~/.config/museum-guide/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("museum-guide").join("config.toml"))
}

/// Load configuration from `path`, falling back to defaults
///
/// A missing file is not an error: a warning is logged and defaults are used.
/// A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read a boolean flag from the environment ("1", "true", "yes", "on")
pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
