use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::{provider::ProviderId, source::SourceOverride};

/// Environment variable that overrides the stored AirNow key.
pub const AIRNOW_KEY_ENV: &str = "AIRNOW_API_KEY";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// HTTP client settings shared by every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-call timeout for JSON APIs.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-call timeout for the global text service, which is slower.
    #[serde(default = "default_global_timeout_secs")]
    pub global_timeout_secs: u64,

    /// api.weather.gov and Nominatim both reject anonymous clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_global_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("weather-cli/{} (https://github.com/weather-task/weather-cli)", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            global_timeout_secs: default_global_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn global_timeout(&self) -> Duration {
        Duration::from_secs(self.global_timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default source: "nws", "wttr" or "auto".
    pub default_source: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,

    /// Example TOML:
    /// [providers.airnow]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Stored default source, `auto` when unset.
    pub fn default_source(&self) -> Result<SourceOverride> {
        match self.default_source.as_deref() {
            None => Ok(SourceOverride::Auto),
            Some(s) => SourceOverride::try_from(s).with_context(|| {
                format!(
                    "Invalid default_source in config.\n\
                     Hint: run `weather configure source` or edit {}.",
                    Self::config_file_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                )
            }),
        }
    }

    pub fn set_default_source(&mut self, source: SourceOverride) {
        self.default_source = Some(source.as_str().to_string());
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// Apply `AIRNOW_API_KEY` from the environment on top of the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(AIRNOW_KEY_ENV) {
            if !key.trim().is_empty() {
                self.upsert_provider_api_key(ProviderId::AirNow, key);
            }
        }
        self
    }
}
