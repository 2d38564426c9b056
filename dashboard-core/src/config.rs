use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::catalog::Catalog;

pub const DEFAULT_COUNTRY: &str = "KR";
pub const DEFAULT_TRANSLATION: &str = "kor";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Base URLs of the three remote collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub countries: String,
    pub rates: String,
    pub weather: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            countries: "https://restcountries.com/v3.1".to_string(),
            rates: "https://api.frankfurter.app".to_string(),
            weather: "https://api.open-meteo.com/v1".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_country = "JP"
/// request_timeout_secs = 5
///
/// [endpoints]
/// rates = "https://api.frankfurter.app"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Country selected on startup.
    pub default_country: String,

    /// RestCountries translation key used for the localized name, e.g. "kor" or "jpn".
    pub translation_language: String,

    pub request_timeout_secs: u64,

    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_country: DEFAULT_COUNTRY.to_string(),
            translation_language: DEFAULT_TRANSLATION.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Checks the configured default country against the catalog.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if !catalog.contains(&self.default_country) {
            return Err(anyhow!(
                "Default country '{}' is not in the catalog.\n\
                 Hint: run `country-dashboard configure` and pick one of the listed countries.",
                self.default_country
            ));
        }
        Ok(())
    }

    pub fn set_default_country(&mut self, code: &str) {
        self.default_country = code.to_uppercase();
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "country-dashboard", "country-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
