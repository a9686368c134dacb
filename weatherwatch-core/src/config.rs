use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Theme;

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "WEATHERWATCH_CONFIG";

/// Base URLs of the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Prefix for `/weather` and `/forecast`.
    pub weather_base: String,
    pub geocode_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather_base: "https://api.openweathermap.org/data/2.5".to_string(),
            geocode_base: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
        }
    }
}

/// Top-level configuration read from disk and the environment.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_location = "Berlin"
/// theme = "light"
///
/// [endpoints]
/// weather_base = "https://api.openweathermap.org/data/2.5"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Looked up once when the app starts.
    pub default_location: String,

    /// Target of the retry action offered after a failed lookup.
    pub fallback_location: String,

    pub theme: Theme,
    pub debounce_ms: u64,
    pub suggestion_limit: u8,
    pub timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_location: "London".to_string(),
            fallback_location: "New York".to_string(),
            theme: Theme::Dark,
            debounce_ms: 300,
            suggestion_limit: 5,
            timeout_secs: 10,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load config from disk (or defaults if no file exists yet), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Apply overrides from an environment lookup function.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(custom));
        }

        let dirs = ProjectDirs::from("dev", "weatherwatch", "weatherwatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The API key, or a configuration error explaining where to put one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                let path = Self::config_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string());
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: export {API_KEY_ENV}=<key> or set `api_key` in {path}."
                )
            })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
