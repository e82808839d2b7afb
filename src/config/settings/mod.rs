
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::config::get_config_dir;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub embedding: EmbeddingServiceConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Connection settings for the search engine's JSON HTTP interface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 9308,
        }
    }
}

/// Connection settings for the embedding generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingServiceConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 3001,
        }
    }
}

/// Tunables for the bulk import pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub preview_rows: usize,
    pub max_file_size_mib: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            preview_rows: 100,
            max_file_size_mib: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(usize),
    #[error("Invalid preview row count: {0} (must be between 1 and 1000)")]
    InvalidPreviewRows(usize),
    #[error("Invalid max file size: {0} MiB (must be between 1 and 1024)")]
    InvalidMaxFileSize(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load() -> Result<Self> {
        let config_dir = get_config_dir().context("Failed to resolve config directory")?;
        Self::load_from(&config_dir)
    }

    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = get_config_dir().context("Failed to resolve config directory")?;
        self.save_to(&config_dir)
    }

    #[inline]
    pub fn save_to<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.engine.protocol, &self.engine.host, self.engine.port)?;
        validate_endpoint(
            &self.embedding.protocol,
            &self.embedding.host,
            self.embedding.port,
        )?;

        if self.import.batch_size == 0 || self.import.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.import.batch_size));
        }

        if self.import.preview_rows == 0 || self.import.preview_rows > 1000 {
            return Err(ConfigError::InvalidPreviewRows(self.import.preview_rows));
        }

        if self.import.max_file_size_mib == 0 || self.import.max_file_size_mib > 1024 {
            return Err(ConfigError::InvalidMaxFileSize(self.import.max_file_size_mib));
        }

        Ok(())
    }

    #[inline]
    pub fn engine_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.engine.protocol, &self.engine.host, self.engine.port)
    }

    #[inline]
    pub fn embedding_url(&self) -> Result<Url, ConfigError> {
        endpoint_url(
            &self.embedding.protocol,
            &self.embedding.host,
            self.embedding.port,
        )
    }

    #[inline]
    pub fn max_file_size_bytes(&self) -> u64 {
        self.import.max_file_size_mib * 1024 * 1024
    }
}

fn validate_endpoint(protocol: &str, host: &str, port: u16) -> Result<(), ConfigError> {
    if protocol != "http" && protocol != "https" {
        return Err(ConfigError::InvalidProtocol(protocol.to_string()));
    }

    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }

    let url_str = format!("{}://{}:{}", protocol, host, port);
    Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

    Ok(())
}

fn endpoint_url(protocol: &str, host: &str, port: u16) -> Result<Url, ConfigError> {
    let url_str = format!("{}://{}:{}", protocol, host, port);
    Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
}
