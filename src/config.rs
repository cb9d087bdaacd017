//! Configuration for the Investigation Agent.

use crate::collector::types::{Coordinate, SortOrder};
use crate::export::BUNDLE_FILE_NAME;
use crate::upload::UploadConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Private document storage where the bundle is written
    pub documents_dir: PathBuf,

    /// File name of the persisted bundle
    pub bundle_file_name: String,

    /// Path for storing the activity log
    pub data_path: PathBuf,

    /// Folder served as the photo library
    pub photos_dir: PathBuf,

    /// Default maximum number of photos per collection
    pub photo_limit: usize,

    /// Default range length, counted back from now
    pub lookback_months: u32,

    /// Default sort order
    pub ascending: bool,

    /// Fixed coordinate reported by the location service, if any
    pub location: Option<Coordinate>,

    /// Receiving endpoint
    pub upload: UploadConfig,

    /// Port used by `serve`
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("investigation-agent");

        Self {
            documents_dir: data_dir.join("Documents"),
            bundle_file_name: BUNDLE_FILE_NAME.to_string(),
            data_path: data_dir,
            photos_dir: dirs::picture_dir().unwrap_or_else(|| PathBuf::from(".")),
            photo_limit: 20,
            lookback_months: 1,
            ascending: false,
            location: None,
            upload: UploadConfig::default(),
            server_port: 5001,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("investigation-agent")
            .join("config.json")
    }

    /// Full path of the persisted bundle.
    pub fn bundle_path(&self) -> PathBuf {
        self.documents_dir.join(&self.bundle_file_name)
    }

    /// Path of the persisted activity log.
    pub fn activity_log_path(&self) -> PathBuf {
        self.data_path.join("activity.json")
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_ascending(self.ascending)
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.documents_dir)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
