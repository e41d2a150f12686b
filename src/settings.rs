//! Application settings storage
//!
//! Stores configuration like the API key in a JSON file in the app data
//! directory. Environment variables take precedence over stored values.
//! Everything is resolved once at startup into a [`Config`] handed to the
//! upstream client, so request handling never does ambient lookups.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Fixed low-cost completion model
pub const DEFAULT_MODEL: &str = "nvidia/nemotron-nano-12b-v2-vl:free";

/// Referrer sent upstream when no site URL is configured
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Resolved process configuration, read-only after startup
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub site_url: String,
    pub model: String,
    pub api_base: String,
}

impl Settings {
    /// Load settings from disk or create default
    fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }
}

/// Initialize settings with the app data directory
pub fn init(app_data_dir: PathBuf) {
    let config_path = app_data_dir.join("settings.json");
    let settings = Settings::load(&config_path);
    *SETTINGS.write().unwrap() = Some(settings);
}

/// Get the current API key (checks env var first, then stored setting)
pub fn get_api_key() -> Option<String> {
    // Environment variable takes precedence
    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }

    // Fall back to stored setting
    let guard = SETTINGS.read().ok()?;
    let settings = guard.as_ref()?;
    settings.openrouter_api_key.clone()
}

/// Check if API key is available
pub fn has_api_key() -> bool {
    get_api_key().map(|k| !k.is_empty()).unwrap_or(false)
}

/// Get masked API key for display (shows first/last 4 chars)
pub fn get_masked_api_key() -> Option<String> {
    get_api_key().map(|key| {
        if key.len() > 12 {
            format!("{}...{}", &key[..8], &key[key.len() - 4..])
        } else {
            "*".repeat(key.len())
        }
    })
}

/// Get the site URL sent as the outbound referrer header
pub fn get_site_url() -> String {
    if let Ok(url) = std::env::var("TERMSCHECK_SITE_URL") {
        if !url.is_empty() {
            return url;
        }
    }

    let guard = SETTINGS.read().ok();
    guard
        .as_ref()
        .and_then(|g| g.as_ref())
        .and_then(|s| s.site_url.clone())
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
}

/// Get the completion model id
pub fn get_model() -> String {
    if let Ok(model) = std::env::var("TERMSCHECK_MODEL") {
        if !model.is_empty() {
            return model;
        }
    }

    let guard = SETTINGS.read().ok();
    guard
        .as_ref()
        .and_then(|g| g.as_ref())
        .and_then(|s| s.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

/// Resolve the full configuration for the upstream client
pub fn load_config() -> Config {
    Config {
        api_key: get_api_key(),
        site_url: get_site_url(),
        model: get_model(),
        api_base: DEFAULT_API_BASE.to_string(),
    }
}
