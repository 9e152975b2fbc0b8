//! The query service.
//!
//! `Database` is the entry point used by the HTTP server and the terminal
//! client. It owns the catalog and runs each query through the same
//! steps: validate, parse, load the tables it needs, execute, format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tabula_sql::executor::QueryExecutor;
use tabula_sql::parser::Parser;
use tabula_sql::storage::{Catalog, DirectorySource, HttpSource, TableSource};
use tracing::{debug, info, warn};

use super::error::{DatabaseError, DatabaseResult};
use super::result::{round_millis, QueryResponse, ResultFormatter, StatusResponse};
use crate::config::{DataSourceConfig, ServerConfig};

/// Which tables are loaded before a query runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Only the tables the query names.
    #[default]
    Referenced,
    /// Every table the source offers.
    All,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Which tables to load before a query.
    pub load_strategy: LoadStrategy,
    /// Report column names for queries that return no rows.
    pub keep_header_on_empty: bool,
    /// Log every query at info level.
    pub query_logging: bool,
    /// Queries slower than this are logged as warnings.
    pub slow_query_threshold_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            load_strategy: LoadStrategy::Referenced,
            keep_header_on_empty: false,
            query_logging: false,
            slow_query_threshold_ms: 1000,
        }
    }
}

impl From<&ServerConfig> for DatabaseConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            load_strategy: config.load_strategy,
            keep_header_on_empty: config.keep_header_on_empty,
            query_logging: config.query_logging,
            slow_query_threshold_ms: config.slow_query_threshold_ms,
        }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Queries that produced a result.
    pub queries_executed: u64,
    /// Queries that failed for any reason.
    pub queries_failed: u64,
    /// Tables currently loaded.
    pub tables_loaded: usize,
    /// Tables the source offers.
    pub tables_available: usize,
    /// Time since the database was opened.
    pub uptime: Duration,
}

/// The query service.
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    catalog: Catalog,
    formatter: ResultFormatter,
    queries_executed: AtomicU64,
    queries_failed: AtomicU64,
    started_at: Instant,
}

impl Database {
    /// Opens a database over the data source named in a server
    /// configuration.
    pub fn open(config: &ServerConfig) -> DatabaseResult<Self> {
        let source: Arc<dyn TableSource> = match &config.data_source {
            DataSourceConfig::Http { base_url } => {
                info!(
                    base_url = %base_url,
                    tables = config.tables.len(),
                    "Using HTTP table source"
                );
                Arc::new(HttpSource::new(base_url.clone(), &config.tables))
            }
            DataSourceConfig::Directory { path } => {
                let source = DirectorySource::open(path).map_err(|e| {
                    DatabaseError::Internal(format!(
                        "Failed to open data directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let source = if config.tables.is_empty() {
                    source
                } else {
                    source.with_tables(&config.tables)
                };
                info!(
                    path = %path.display(),
                    tables = source.table_names().len(),
                    "Using directory table source"
                );
                Arc::new(source)
            }
        };
        Ok(Self::with_source(source, DatabaseConfig::from(config)))
    }

    /// Creates a database over any table source.
    pub fn with_source(source: Arc<dyn TableSource>, config: DatabaseConfig) -> Self {
        Self {
            formatter: ResultFormatter::new(config.keep_header_on_empty),
            config,
            catalog: Catalog::new(source),
            queries_executed: AtomicU64::new(0),
            queries_failed: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Loads every table the source offers.
    pub fn preload(&self) -> DatabaseResult<()> {
        let start = Instant::now();
        self.catalog.load_all()?;
        info!(
            tables = self.catalog.loaded_tables().len(),
            elapsed_ms = round_millis(start.elapsed()),
            "Preloaded tables"
        );
        Ok(())
    }

    /// Runs one query.
    ///
    /// The reported execution time covers parsing and execution. Time spent
    /// loading tables is not included.
    pub fn run_query(&self, sql: &str) -> DatabaseResult<QueryResponse> {
        let result = self.run_query_inner(sql);
        match &result {
            Ok(_) => self.queries_executed.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.queries_failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    fn run_query_inner(&self, sql: &str) -> DatabaseResult<QueryResponse> {
        if sql.trim().is_empty() {
            return Err(DatabaseError::invalid_query());
        }
        if self.config.query_logging {
            info!(sql = %sql, "Executing query");
        }

        let parse_start = Instant::now();
        let statement = Parser::parse(sql)?;
        let parse_time = parse_start.elapsed();

        let loaded = match self.config.load_strategy {
            LoadStrategy::Referenced => self.catalog.ensure_loaded(statement.referenced_tables()),
            LoadStrategy::All => self.catalog.load_all(),
        };
        if let Err(e) = loaded {
            warn!(error = %e, "Tables for query could not be loaded");
            return Err(e.into());
        }

        let execute_start = Instant::now();
        let result = QueryExecutor::new(&self.catalog).execute(&statement)?;
        let elapsed = parse_time + execute_start.elapsed();

        let response = self.formatter.format(result, elapsed);
        debug!(
            rows = response.row_count(),
            execution_time_ms = response.execution_time,
            "Query finished"
        );
        if response.execution_time > self.config.slow_query_threshold_ms {
            warn!(
                sql = %sql,
                execution_time_ms = response.execution_time,
                threshold_ms = self.config.slow_query_threshold_ms,
                "Slow query"
            );
        }
        Ok(response)
    }

    /// Current readiness.
    pub fn status(&self) -> StatusResponse {
        StatusResponse::from(self.catalog.status())
    }

    /// Returns database statistics.
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            tables_loaded: self.catalog.loaded_tables().len(),
            tables_available: self.catalog.table_names().len(),
            uptime: self.started_at.elapsed(),
        }
    }

    /// Returns uptime.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_sql::storage::MemorySource;

    fn database(config: DatabaseConfig) -> (Database, Arc<MemorySource>) {
        let source = Arc::new(
            MemorySource::new()
                .with_table("shippers", "shipper_id,company_name\n1,Speedy Express\n2,United Package\n")
                .with_table("regions", "region_id,region_description\n1,Eastern\n"),
        );
        (Database::with_source(source.clone(), config), source)
    }

    #[test]
    fn test_empty_query_is_rejected_before_loading() {
        let (db, source) = database(DatabaseConfig::default());
        for sql in ["", "   \n"] {
            let err = db.run_query(sql).unwrap_err();
            assert!(matches!(err, DatabaseError::InvalidRequest(_)));
            assert_eq!(err.to_string(), "Invalid query");
        }
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(db.stats().queries_failed, 2);
    }

    #[test]
    fn test_loads_only_referenced_tables() {
        let (db, source) = database(DatabaseConfig::default());
        let response = db.run_query("SELECT * FROM shippers").unwrap();
        assert_eq!(response.row_count(), 2);
        assert_eq!(source.fetch_count(), 1);
        assert_eq!(db.catalog().loaded_tables(), vec!["shippers".to_string()]);

        db.run_query("SELECT company_name FROM shippers").unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_load_all_strategy() {
        let (db, source) = database(DatabaseConfig {
            load_strategy: LoadStrategy::All,
            ..Default::default()
        });
        db.run_query("SELECT 1").unwrap();
        assert_eq!(source.fetch_count(), 2);
        assert!(db.status().ready);
    }

    #[test]
    fn test_sql_errors() {
        let (db, _) = database(DatabaseConfig::default());
        let err = db.run_query("SELEC * FROM shippers").unwrap_err();
        assert!(matches!(err, DatabaseError::Parse(_)));
        assert!(err.to_string().starts_with("SQL Error: "));

        let err = db.run_query("SELECT * FROM nowhere").unwrap_err();
        assert!(matches!(err, DatabaseError::Execution(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_status_and_stats() {
        let (db, _) = database(DatabaseConfig::default());
        let status = db.status();
        assert!(!status.ready);
        assert_eq!(status.message.as_deref(), Some("Database not initialized"));

        db.preload().unwrap();
        assert_eq!(
            db.status(),
            StatusResponse {
                ready: true,
                message: None
            }
        );

        db.run_query("SELECT * FROM regions").unwrap();
        let stats = db.stats();
        assert_eq!(stats.queries_executed, 1);
        assert_eq!(stats.tables_loaded, 2);
        assert_eq!(stats.tables_available, 2);
    }
}
