//! Configuration management for reqdash

use crate::refresh::{clamp_interval, RefreshDefaults};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `api.base_url`
pub const ENV_API_URL: &str = "REQDASH_API_URL";

/// Environment variable overriding `auth.admin_password`
pub const ENV_ADMIN_PASSWORD: &str = "REQDASH_ADMIN_PASSWORD";

/// Largest page the analytics API serves
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub refresh: RefreshSettings,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the analytics service, without the `/requests` suffix
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_password: "admin123".to_string(),
        }
    }
}

/// Starting intervals of the three refresh channels, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshSettings {
    pub overview_secs: u64,
    pub charts_secs: u64,
    pub table_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            overview_secs: 30,
            charts_secs: 60,
            table_secs: 45,
        }
    }
}

impl RefreshSettings {
    /// Intervals for the coordinator, clamped to the accepted range
    pub fn defaults(&self) -> RefreshDefaults {
        let secs = |s: u64| clamp_interval(Duration::from_secs(s));
        RefreshDefaults {
            overview: secs(self.overview_secs),
            charts: secs(self.charts_secs),
            table: secs(self.table_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Rows per page of the requests table
    pub page_size: u32,
    /// Days covered by the initial date range
    pub default_range_days: i64,
    /// Models offered by the model selector
    pub models: Vec<String>,
    /// Where CSV exports are written
    pub export_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_range_days: 30,
            models: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file used while the dashboard owns the terminal
    /// (default: `reqdash.log` in the data directory)
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or the default location, or defaults
    ///
    /// Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // An explicit path must exist; the default location is optional
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Config::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD).filter(|v| !v.is_empty()) {
            self.auth.admin_password = password;
        }
    }

    /// Reject values the dashboard cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if self.auth.admin_password.is_empty() {
            return Err(ConfigError::Invalid("auth.admin_password is empty".into()));
        }
        if self.dashboard.page_size == 0 || self.dashboard.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "dashboard.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.dashboard.default_range_days <= 0 {
            return Err(ConfigError::Invalid(
                "dashboard.default_range_days must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reqdash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Directory for logs and other runtime files
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "reqdash")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log file used by the dashboard
    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("reqdash.log"))
    }
}
