//! Configuration System
//!
//! Handles loading the tap configuration from files and environment variables.
//! Supports TOML config files as well as the flat JSON files tap runners pass
//! with `--config`; the format is picked from the file extension.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the OAuth2 credentials file
pub const CREDENTIALS_FILE_ENV: &str = "OAUTH2_CREDENTIALS_FILE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Stream selection, kept at the top level for tap runner compatibility
    #[serde(flatten)]
    pub tap: TapConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to extract
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TapConfig {
    /// Dimensions of the stream; empty selects all of them
    #[serde(default)]
    pub dimensions: Vec<String>,

    /// Optional allow-list of sites to extract
    #[serde(default)]
    pub site_urls: Option<Vec<String>>,

    /// First day to extract when no checkpoint exists
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Path to the OAuth2 credentials file
    #[serde(default)]
    pub oauth2_credentials_file: Option<PathBuf>,
}

/// Reporting backend client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries after the first attempt; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_uri: default_token_uri(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };

        config.map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    fn from_json_str(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file locations searched when none is given
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("searchtap").join("config.toml"));
        }
        paths.push(PathBuf::from("./config.toml"));
        paths
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        Self::load_first(&Self::default_paths())
    }

    /// Load the first candidate that exists and parses, else defaults
    pub fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Credentials file from config, falling back to the environment
    pub fn credentials_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.tap.oauth2_credentials_file {
            return Ok(path.clone());
        }

        std::env::var_os(CREDENTIALS_FILE_ENV)
            .map(PathBuf::from)
            .ok_or_else(|| {
                ConfigError::Missing(format!(
                    "missing required config 'oauth2_credentials_file' or environment '{}'",
                    CREDENTIALS_FILE_ENV
                ))
            })
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Client overrides
        if let Ok(url) = std::env::var("SEARCHTAP_API_URL") {
            self.client.base_url = url;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("SEARCHTAP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SEARCHTAP_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("{0}")]
    Missing(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# searchtap configuration
#
# Environment variables override these settings:
# - OAUTH2_CREDENTIALS_FILE (used when oauth2_credentials_file is unset)
# - SEARCHTAP_API_URL
# - SEARCHTAP_LOG_LEVEL
# - SEARCHTAP_LOG_FORMAT

# Dimensions of the extracted stream: country, page, query, device, date.
# Leave empty to group by all of them.
dimensions = ["page", "query"]

# Sites to extract. Leave unset to extract every verified site.
# site_urls = ["https://example.com/"]

# First day to extract when no checkpoint exists (default: 24 weeks ago)
# start_date = "2024-01-01"

# OAuth2 credentials file, rewritten after every token refresh
oauth2_credentials_file = "credentials.json"

[client]
# Reporting API base URL
base_url = "https://www.googleapis.com"

# OAuth2 token endpoint
token_uri = "https://oauth2.googleapis.com/token"

# Request timeout in seconds
request_timeout_secs = 30

# Retries for timeouts, rate limits and server errors
max_retries = 3

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path (logs go to stderr otherwise)
# file = "/var/log/searchtap.log"
"#
    .to_string()
}
