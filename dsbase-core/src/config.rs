//! Configuration management for dsbase
//!
//! Config files are stored in platform-appropriate locations:
//! - Linux: ~/.config/dsbase/
//! - macOS: ~/Library/Application Support/dsbase/
//! - Windows: %APPDATA%\dsbase\

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoDirFound,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the administration API lives and which repo it administers
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Session token persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Behavior switches kept for compatibility testing
    #[serde(default)]
    pub compat: CompatConfig,
}

/// API origin and repository identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// API origin without port (e.g. "http://device.local")
    pub origin: Option<String>,

    /// Port of the administration API on `origin`
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Origin serving uploaded content; defaults to `origin`
    pub content_origin: Option<String>,

    /// Repository owner
    pub user: Option<String>,

    /// Repository name
    pub repo: Option<String>,
}

/// Session store selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreKind,

    /// Token file override (file store only)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Send the legacy fixed filename on remove instead of the caller's
    #[serde(default)]
    pub fixed_remove_filename: bool,
}

fn default_api_port() -> u16 {
    crate::DEFAULT_API_PORT
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            origin: None,
            api_port: default_api_port(),
            content_origin: None,
            user: None,
            repo: None,
        }
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("dsbase"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
