//! Configuration management
//!
//! Settings live in `settings.json` in the data directory:
//! ```json
//! {
//!   "api": { "baseUrl": "https://...", "userId": "1", "timeoutSecs": 30 },
//!   "app": { "demoMode": false }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::domain::result::Error;

pub const DEFAULT_USER_ID: &str = "1";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    app: AppSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub base_url: String,
    pub user_id: String,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    pub demo_mode: bool,
}

mod secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            demo_mode: false,
        }
    }
}

/// Settings a user can change with `vl config set`
pub const SETTABLE_KEYS: &[&str] = &["api.baseUrl", "api.userId", "api.timeoutSecs", "app.demoMode"];

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

/// Check that a base URL is absolute http(s)
pub fn validate_base_url(raw: &str) -> std::result::Result<String, Error> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| Error::config(format!("Invalid API base URL '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim().trim_end_matches('/').to_string()),
        other => Err(Error::config(format!(
            "API base URL must use http or https, got '{}'",
            other
        ))),
    }
}

/// Data directory: `$VAULTLINE_DIR`, else `~/.vaultline`
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("VAULTLINE_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".vaultline"))
}

impl Config {
    /// Load config from the data directory
    ///
    /// `VAULTLINE_BASE_URL` and `VAULTLINE_DEMO_MODE` override the file.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(data_dir)?;
        let mut config = Self::from_settings(&raw)?;

        if let Ok(url) = std::env::var("VAULTLINE_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = validate_base_url(&url)?;
            }
        }
        if let Some(demo) = std::env::var("VAULTLINE_DEMO_MODE")
            .ok()
            .as_deref()
            .and_then(parse_bool)
        {
            config.demo_mode = demo;
        }

        Ok(config)
    }

    fn from_settings(raw: &SettingsFile) -> Result<Self> {
        let defaults = Self::default();
        let base_url = match &raw.api.base_url {
            Some(url) => validate_base_url(url)?,
            None => defaults.base_url,
        };
        Ok(Self {
            base_url,
            user_id: raw.api.user_id.clone().unwrap_or(defaults.user_id),
            request_timeout: raw
                .api
                .timeout_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            demo_mode: raw.app.demo_mode,
        })
    }

    fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
        let settings_path = data_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(&settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Save config, preserving settings this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let mut settings = Self::read_settings(data_dir)?;

        settings.api.base_url = Some(self.base_url.clone());
        settings.api.user_id = Some(self.user_id.clone());
        settings.api.timeout_secs = Some(self.request_timeout.as_secs());
        settings.app.demo_mode = self.demo_mode;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Apply a `key = value` pair from the CLI
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), Error> {
        match key {
            "api.baseUrl" => self.base_url = validate_base_url(value)?,
            "api.userId" => {
                let id = value.trim();
                if id.is_empty() {
                    return Err(Error::config("User id cannot be empty"));
                }
                self.user_id = id.to_string();
            }
            "api.timeoutSecs" => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| Error::config(format!("'{}' is not a number of seconds", value)))?;
                if secs == 0 {
                    return Err(Error::config("Timeout must be at least 1 second"));
                }
                self.request_timeout = Duration::from_secs(secs);
            }
            "app.demoMode" => {
                self.demo_mode = parse_bool(value)
                    .ok_or_else(|| Error::config(format!("'{}' is not true or false", value)))?;
            }
            other => {
                return Err(Error::config(format!(
                    "Unknown setting '{}'. Settable keys: {}",
                    other,
                    SETTABLE_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
