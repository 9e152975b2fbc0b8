//! Configuration file support for the CLI.
//!
//! Loads and saves CLI configuration from TOML files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tabula_server::config::ServerConfig;
use tabula_server::database::LoadStrategy;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Read tables from CSV files in this directory instead of over HTTP.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// URL prefix of the CSV files when fetching over HTTP.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Load every table on the first query.
    #[serde(default)]
    pub load_all: bool,

    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Enable timing by default.
    #[serde(default)]
    pub timing: bool,

    /// Query history file path.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Maximum number of input lines kept for line editing.
    #[serde(default = "default_line_history_size")]
    pub line_history_size: usize,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_line_history_size() -> usize {
    1000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: None,
            load_all: false,
            output_format: default_format(),
            timing: false,
            history_file: None,
            line_history_size: default_line_history_size(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/tabula/config.toml
    /// 2. ~/.tabula/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tabula").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tabula").join("config.toml"))
    }

    /// The query history file: the configured path, else `history.json`
    /// under the user's data directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("tabula").join("history.json")))
    }

    /// The server configuration used to open the embedded database.
    pub fn server_config(&self) -> ServerConfig {
        let mut builder = ServerConfig::builder();
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir.clone());
        }
        if self.load_all {
            builder = builder.load_strategy(LoadStrategy::All);
        }
        builder.keep_header_on_empty(true).build()
    }
}
