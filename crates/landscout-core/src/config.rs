//! Configuration management for Landscout.
//!
//! Provides TOML-based configuration with XDG-compliant paths,
//! environment variable overrides and named search profiles.

use crate::criteria::Profile;
use crate::error::{ConfigError, ConfigResult, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/landscout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database settings
    pub database: DatabaseConfig,
    /// Browser and scraping settings
    pub scraping: ScrapingConfig,
    /// Name of the profile used when none is given
    pub active_profile: String,
    /// Search profiles keyed by name
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scraping: ScrapingConfig::default(),
            active_profile: "default".to_string(),
            profiles: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let mut config: Self = toml::from_str(&contents)?;
            config.fill_profile_names();
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `LANDSCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `LANDSCOUT_DB_PATH`: Override the database path
    /// - `LANDSCOUT_PROFILE`: Override the active profile
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LANDSCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.scraping.headless = headless;
                tracing::debug!("Override scraping.headless from env: {}", headless);
            }
        }

        if let Ok(path) = std::env::var("LANDSCOUT_DB_PATH") {
            tracing::debug!("Override database.path from env: {}", path);
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(profile) = std::env::var("LANDSCOUT_PROFILE") {
            tracing::debug!("Override active_profile from env: {}", profile);
            self.active_profile = profile;
        }
    }

    /// Profiles are keyed by name in TOML; keep the inner name in sync.
    fn fill_profile_names(&mut self) {
        for (key, profile) in &mut self.profiles {
            if profile.name.is_empty() {
                profile.name.clone_from(key);
            }
        }
    }

    /// Save configuration to the default path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get a profile by name.
    pub fn profile(&self, name: &str) -> ConfigResult<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Get the active profile.
    pub fn active(&self) -> ConfigResult<&Profile> {
        self.profile(&self.active_profile)
    }

    /// The named profile, or the active one, after validating its criteria.
    pub fn search_profile(&self, name: Option<&str>) -> Result<&Profile> {
        let profile = match name {
            Some(name) => self.profile(name)?,
            None => self.active()?,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Names of all configured profiles.
    #[must_use]
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Switch the active profile; the profile must exist.
    pub fn set_active_profile(&mut self, name: &str) -> ConfigResult<()> {
        self.profile(name)?;
        self.active_profile = name.to_string();
        Ok(())
    }

    /// Resolved database path: the configured one or `<data_dir>/landscout.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("landscout.db")),
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/landscout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "landscout", "landscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/landscout`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "landscout", "landscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path; defaults to the XDG data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Browser and scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Base delay between consecutive page actions per source, in milliseconds
    pub default_rate_limit_ms: u64,
    /// Run the shared browser without a window
    pub headless: bool,
    /// Apply anti-automation-detection measures
    pub stealth: bool,
    /// User agent for the shared browser context; empty picks a built-in one
    pub user_agent: String,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            default_rate_limit_ms: 2500,
            headless: true,
            stealth: true,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
        }
    }
}
