use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub content: ContentConfig,
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the hosted content lake.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    pub project_id: String,
    pub dataset: String,
    /// `1`, `X` or a `YYYY-MM-DD` date, without the leading `v`.
    pub api_version: String,
    pub use_cdn: bool,
    pub token: Option<String>,
    /// Replaces `https://<project>.api.sanity.io` when set.
    pub api_host: Option<String>,
    pub image_cdn: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            project_id: "txpkguha".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-11-01".to_string(),
            use_cdn: false,
            token: None,
            api_host: None,
            image_cdn: "https://cdn.sanity.io".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub zone: DisplayZone,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file_prefix: "event-page.log".to_string(),
        }
    }
}

impl Config {
    /// Loads `path`, falling back to defaults when the file does not exist,
    /// then applies environment overrides and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&config_content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// `lookup` is injected so tests don't have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SANITY_PROJECT_ID") {
            self.content.project_id = v;
        }
        if let Some(v) = lookup("SANITY_DATASET") {
            self.content.dataset = v;
        }
        if let Some(v) = lookup("SANITY_API_VERSION") {
            self.content.api_version = v.trim_start_matches('v').to_string();
        }
        if let Some(v) = lookup("SANITY_API_TOKEN") {
            self.content.token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = lookup("SANITY_API_HOST") {
            self.content.api_host = Some(v).filter(|h| !h.is_empty());
        }
        if let Some(port) = lookup("PORT").and_then(|s| s.parse().ok()) {
            self.server.port = port;
        }
        if let Some(v) = lookup("LOG_DIR") {
            self.logging.dir = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.content.validate()
    }
}

impl ContentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("content.project_id must not be empty".into()));
        }
        if self.dataset.trim().is_empty() {
            return Err(ConfigError::Invalid("content.dataset must not be empty".into()));
        }
        validate_api_version(&self.api_version)
    }
}

pub fn validate_api_version(version: &str) -> Result<()> {
    let version = version.trim_start_matches('v');
    if version == "1" || version == "X" {
        return Ok(());
    }
    NaiveDate::parse_from_str(version, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            ConfigError::Invalid(format!(
                "api_version must be `1`, `X` or a YYYY-MM-DD date, got `{version}`"
            ))
        })
}
