use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    fetch::{MAX_RETRY_COUNT, REQUEST_TIMEOUT, RETRY_DELAY},
    format::DEFAULT_UTC_OFFSET_HOURS,
    provider::openweather::{DEFAULT_BASE_URL, DEFAULT_LANG, DEFAULT_UNITS},
};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_CITY: &str = "Tokyo";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Osaka"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather `appid`.
    pub api_key: Option<String>,
    pub default_city: String,
    pub base_url: String,
    pub lang: String,
    pub units: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Zone used to decide which forecast day is "today".
    pub utc_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: DEFAULT_CITY.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            units: DEFAULT_UNITS.to_string(),
            timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
            max_retries: MAX_RETRY_COUNT,
            retry_delay_ms: RETRY_DELAY.as_millis() as u64,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// `OPENWEATHER_API_KEY` takes precedence over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_key(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "woff-weather", "woff-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_constants() {
        let cfg = Config::default();

        assert_eq!(cfg.default_city, "Tokyo");
        assert_eq!(cfg.timeout(), Duration::from_millis(10_000));
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_delay(), Duration::from_millis(1_000));
        assert_eq!(cfg.lang, "ja");
        assert_eq!(cfg.units, "metric");
        assert_eq!(cfg.utc_offset_hours, 9);
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str("api_key = \"KEY\"\ndefault_city = \"Osaka\"\n").unwrap();

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.default_city, "Osaka");
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.base_url, "https://api.openweathermap.org/data/2.5");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("STORED".into());

        cfg.apply_env_key(Some("FROM_ENV".into()));
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));

        cfg.apply_env_key(Some(String::new()));
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));

        cfg.apply_env_key(None);
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));
    }

    #[test]
    fn save_and_load_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("woff-weather-cfg-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.default_city = "Sapporo".into();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("woff-weather-does-not-exist").join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
