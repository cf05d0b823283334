//! Configuration resolution for museum-guide
//!
//! Turns the TOML config plus environment overrides into the explicit
//! settings each component takes. Secrets resolve ENV → TOML.

use crate::services::{GoogleCloudSettings, QuotaConfig, RecognitionConfig};
use museum_common::config::{env_flag, TomlConfig};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{info, warn};

pub const API_KEY_ENV: &str = "MUSEUM_GUIDE_GOOGLE_API_KEY";
pub const PROJECT_ID_ENV: &str = "GOOGLE_CLOUD_PROJECT_ID";
pub const DEMO_MODE_ENV: &str = "MUSEUM_GUIDE_DEMO_MODE";

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct GuideSettings {
    pub app_name: String,
    pub bind_address: String,
    pub catalog_path: Option<PathBuf>,
    /// Peers allowed to report the client address via `X-Forwarded-For`
    pub trusted_proxies: Vec<IpAddr>,
    pub recognition: RecognitionConfig,
    pub quota: QuotaConfig,
    pub google: GoogleCloudSettings,
    pub tts_voice: Option<String>,
}

impl GuideSettings {
    /// Resolve settings from `toml_config` and the process environment
    ///
    /// `force_demo` (the `--demo` flag) turns demo mode on regardless of
    /// other sources.
    pub fn resolve(toml_config: &TomlConfig, force_demo: bool) -> Self {
        let demo_mode = resolve_demo_mode(force_demo, toml_config);
        let api_key = resolve_google_api_key(toml_config);
        let project_id = resolve_project_id(toml_config);

        if api_key.is_none() {
            if demo_mode {
                info!("Google Cloud API key not configured, demo fallback will serve results");
            } else {
                warn!(
                    "Google Cloud API key not configured. Recognition will report upstream \
                     unavailable. Configure using {} or [google_cloud] api_key",
                    API_KEY_ENV
                );
            }
        }

        let min_match_score = toml_config.min_match_score;
        let min_match_score = if (0.0..=1.0).contains(&min_match_score) {
            min_match_score
        } else {
            warn!(min_match_score, "min_match_score outside 0.0-1.0, using 0.5");
            0.5
        };

        let security = &toml_config.security;
        let window_seconds = i64::try_from(security.window_seconds).unwrap_or(i64::MAX);

        Self {
            app_name: toml_config.app_name.clone(),
            bind_address: toml_config.bind_address.clone(),
            catalog_path: toml_config.catalog_path.clone(),
            trusted_proxies: parse_trusted_proxies(&security.trusted_proxies),
            recognition: RecognitionConfig {
                demo_mode,
                canonical_language: toml_config.canonical_language.clone(),
                min_match_score,
            },
            quota: QuotaConfig {
                per_caller_limit: security.api_rate_limit,
                global_limit: security.daily_limit,
                window: chrono::Duration::try_seconds(window_seconds)
                    .unwrap_or_else(|| chrono::Duration::days(1)),
                allowed_callers: security
                    .allowed_callers
                    .iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            },
            google: GoogleCloudSettings {
                api_key,
                project_id,
                requests_per_second: toml_config.google_cloud.requests_per_second,
            },
            tts_voice: toml_config.google_cloud.tts_voice.clone(),
        }
    }
}

/// Resolve the Google Cloud API key
///
/// **Priority:** ENV → TOML
pub fn resolve_google_api_key(toml_config: &TomlConfig) -> Option<String> {
    resolve_secret(
        "Google Cloud API key",
        API_KEY_ENV,
        toml_config.google_cloud.api_key.as_deref(),
    )
}

/// Resolve the Google Cloud project id
///
/// **Priority:** ENV → TOML
pub fn resolve_project_id(toml_config: &TomlConfig) -> Option<String> {
    resolve_secret(
        "Google Cloud project id",
        PROJECT_ID_ENV,
        toml_config.google_cloud.project_id.as_deref(),
    )
}

/// Demo mode is on if any of `--demo`, `MUSEUM_GUIDE_DEMO_MODE`, or the
/// TOML `demo_mode` says so; the environment can also switch it off.
pub fn resolve_demo_mode(force_demo: bool, toml_config: &TomlConfig) -> bool {
    if force_demo {
        return true;
    }
    env_flag(DEMO_MODE_ENV).unwrap_or(toml_config.demo_mode)
}

/// Parse proxy addresses, skipping entries that are not IP addresses
pub fn parse_trusted_proxies(entries: &[String]) -> Vec<IpAddr> {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .filter_map(|e| match e.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!(entry = %e, "Ignoring trusted proxy that is not an IP address");
                None
            }
        })
        .collect()
}

/// Validate a secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn resolve_secret(what: &str, env_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_name).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in both environment and TOML. Using environment (highest priority).",
            what
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", what);
        return Some(value.trim().to_string());
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", what);
        return Some(value.trim().to_string());
    }

    None
}
