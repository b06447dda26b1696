//! Configuration loading and management for newsbrief.
//!
//! Loads settings from `newsbrief.toml` with environment variable overrides for
//! sensitive data. Every section has defaults, so running without a config
//! file talks to the public inference API with the BBC News feeds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "newsbrief.toml";

/// Environment variable holding the inference API token
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Summarisation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier on the inference endpoint
    pub name: String,
    /// Base URL; the model name is appended as a path segment
    pub endpoint: String,
    /// Per-request timeout, generous because CPU inference is slow
    pub timeout_secs: u64,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub hf_token: Option<String>,
}

/// HTTP settings for page and feed downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Defaults for single-text summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Approximate TL;DR length in characters
    pub max_chars: usize,
}

/// News digest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// RSS or Atom feeds searched for matching items
    pub feeds: Vec<String>,
    /// Requested article count; clamped to the digest cap at run time
    pub max_articles: usize,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub digest: DigestConfig,
}

impl Config {
    /// Load configuration from the default location (newsbrief.toml in cwd or
    /// home), falling back to built-in defaults when neither exists
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::parse_file(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path, which must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    // Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(TOKEN_ENV) {
            if !key.trim().is_empty() {
                self.api.hf_token = Some(key);
            }
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::home_dir()
            .map(|home| home.join(".config").join("newsbrief").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the model's inference route
    pub fn url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.name)
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "sshleifer/distilbart-cnn-12-6".to_string(),
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!(
                "newsbrief/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/cladam/newsbrief)"
            )
            .to_string(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { max_chars: 300 }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        let feeds = [
            "https://feeds.bbci.co.uk/news/rss.xml",
            "https://feeds.bbci.co.uk/news/world/rss.xml",
            "https://feeds.bbci.co.uk/news/uk/rss.xml",
            "https://feeds.bbci.co.uk/news/world/europe/rss.xml",
            "https://feeds.bbci.co.uk/news/world/asia/rss.xml",
            "https://feeds.bbci.co.uk/news/world/us_and_canada/rss.xml",
            "https://feeds.bbci.co.uk/news/world/middle_east/rss.xml",
        ];
        Self {
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
            max_articles: 3,
        }
    }
}
