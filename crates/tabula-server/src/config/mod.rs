//! Server configuration.
//!
//! This module provides configuration management for the Tabula server.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tabula_sql::storage::{NORTHWIND_BASE_URL, NORTHWIND_TABLES};

use crate::database::LoadStrategy;

/// Where table data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataSourceConfig {
    /// `GET {base_url}/{table}.csv`.
    Http {
        /// URL prefix of the CSV files.
        base_url: String,
    },
    /// `{path}/{table}.csv` on the local filesystem.
    Directory {
        /// Directory holding the CSV files.
        path: PathBuf,
    },
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        DataSourceConfig::Http {
            base_url: NORTHWIND_BASE_URL.to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tables to serve. For a directory source an empty list means every
    /// CSV file found.
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,

    /// Which tables to load before each query.
    #[serde(default)]
    pub load_strategy: LoadStrategy,

    /// Load every table at startup.
    #[serde(default)]
    pub preload: bool,

    /// Report column names for queries that return no rows.
    #[serde(default)]
    pub keep_header_on_empty: bool,

    /// Enable query logging.
    #[serde(default)]
    pub query_logging: bool,

    /// Enable slow query logging (queries taking longer than this threshold).
    #[serde(default = "default_slow_query_threshold")]
    pub slow_query_threshold_ms: u64,

    /// Table data source.
    #[serde(default)]
    pub data_source: DataSourceConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_tables() -> Vec<String> {
    NORTHWIND_TABLES.iter().map(|t| t.to_string()).collect()
}

fn default_slow_query_threshold() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tables: default_tables(),
            load_strategy: LoadStrategy::default(),
            preload: false,
            keep_header_on_empty: false,
            query_logging: false,
            slow_query_threshold_ms: default_slow_query_threshold(),
            data_source: DataSourceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Creates a builder for configuration.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }
}

/// Builder for server configuration.
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Fetches tables over HTTP from a base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.data_source = DataSourceConfig::Http {
            base_url: url.into(),
        };
        self
    }

    /// Reads tables from a directory of CSV files, serving every file
    /// found.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_source = DataSourceConfig::Directory { path: dir.into() };
        self.config.tables.clear();
        self
    }

    /// Sets the tables to serve.
    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the load strategy.
    pub fn load_strategy(mut self, strategy: LoadStrategy) -> Self {
        self.config.load_strategy = strategy;
        self
    }

    /// Loads every table at startup.
    pub fn preload(mut self, enabled: bool) -> Self {
        self.config.preload = enabled;
        self
    }

    /// Reports column names for empty results.
    pub fn keep_header_on_empty(mut self, enabled: bool) -> Self {
        self.config.keep_header_on_empty = enabled;
        self
    }

    /// Enables query logging.
    pub fn query_logging(mut self, enabled: bool) -> Self {
        self.config.query_logging = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ServerConfig {
        self.config
    }
}
