//! Application configuration structures.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Lower bound for the refresh interval, to avoid hammering the source site.
pub const MIN_INTERVAL_SECS: u64 = 300;

/// Refresh interval used when none is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Monitored municipality instances
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::validation("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.client.base_url).map_err(|e| {
            AppError::validation(format!(
                "client.base_url '{}' is not a valid URL: {}",
                self.client.base_url, e
            ))
        })?;
        if self.instances.is_empty() {
            return Err(AppError::validation("No instances defined"));
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            if instance.name.trim().is_empty() {
                return Err(AppError::validation("instance name is required"));
            }
            instance.refresh_config()?;
            if !seen.insert(instance.key()) {
                return Err(AppError::validation(format!(
                    "instance {} is already configured",
                    instance.key()
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme and host the listing pages and detail links live under
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (`RUST_LOG` takes precedence)
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// One monitored municipality page, as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// User-chosen instance name
    pub name: String,

    /// Path segment selecting the municipality page
    pub municipality: String,

    /// Refresh interval in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl InstanceConfig {
    /// Identity of this instance, on the same trimmed municipality the
    /// monitor fetches.
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.municipality.trim(), self.name.trim())
    }

    /// Validated refresh parameters for this instance.
    pub fn refresh_config(&self) -> Result<RefreshConfig> {
        RefreshConfig::new(&self.municipality, self.interval_secs)
            .map_err(|e| AppError::validation(format!("instance '{}': {}", self.name, e)))
    }
}

/// Identity of a monitored instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceKey {
    pub municipality: String,
    pub name: String,
}

impl InstanceKey {
    pub fn new(municipality: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            municipality: municipality.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.municipality)
    }
}

/// Validated refresh parameters for one monitor.
///
/// Only constructible through [`RefreshConfig::new`], so a monitor can never
/// run with an empty municipality or an interval below [`MIN_INTERVAL_SECS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    municipality_id: String,
    interval_seconds: u64,
}

impl RefreshConfig {
    pub fn new(municipality_id: impl Into<String>, interval_seconds: u64) -> Result<Self> {
        let municipality_id = municipality_id.into().trim().to_string();
        if municipality_id.is_empty() {
            return Err(AppError::validation("municipality is required"));
        }
        if interval_seconds < MIN_INTERVAL_SECS {
            return Err(AppError::validation(format!(
                "interval_secs must be at least {MIN_INTERVAL_SECS}, got {interval_seconds}"
            )));
        }
        Ok(Self {
            municipality_id,
            interval_seconds,
        })
    }

    pub fn with_default_interval(municipality_id: impl Into<String>) -> Result<Self> {
        Self::new(municipality_id, DEFAULT_INTERVAL_SECS)
    }

    pub fn municipality_id(&self) -> &str {
        &self.municipality_id
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

mod defaults {
    // Client defaults
    pub fn base_url() -> String {
        "https://www.planviewer.nl".into()
    }
    pub fn user_agent() -> String {
        "Planviewer Announcement Monitor".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }

    // Instance defaults
    pub fn interval() -> u64 {
        super::DEFAULT_INTERVAL_SECS
    }
}
