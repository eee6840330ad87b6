use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    /// SQLite file; defaults to `health_records.db` in the config directory
    pub database_path: Option<PathBuf>,

    /// Uploaded document copies; defaults to `uploaded_docs` in the config directory
    pub documents_dir: Option<PathBuf>,

    /// Wrap around at either end of the record list instead of stopping
    pub wrap_navigation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            database_path: None,
            documents_dir: None,
            wrap_navigation: false,
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from file, writing the defaults when it does not exist yet
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        config.save(path)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".health-records"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Get the database file path
    pub fn get_database_path(&self) -> Result<PathBuf> {
        match self.database_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::default_config_dir()?.join("health_records.db")),
        }
    }

    /// Get the documents directory
    pub fn get_documents_dir(&self) -> Result<PathBuf> {
        match self.documents_dir {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::default_config_dir()?.join("uploaded_docs")),
        }
    }
}
