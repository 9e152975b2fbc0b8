//! Where table text comes from.
//!
//! A [`TableSource`] maps table names to raw delimited text. Three sources
//! are provided: remote files over HTTP, `*.csv` files in a local
//! directory, and in-memory strings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use reqwest::blocking::Client;

use tracing::debug;

use super::error::{LoadError, LoadResult};

/// Base location of the Northwind sample data set.
pub const NORTHWIND_BASE_URL: &str =
    "https://raw.githubusercontent.com/graphql-compose/graphql-compose-examples/master/examples/northwind/data/csv";

/// Tables of the Northwind sample data set.
pub const NORTHWIND_TABLES: &[&str] = &[
    "categories",
    "customers",
    "employees",
    "order_details",
    "orders",
    "products",
    "regions",
    "shippers",
    "suppliers",
    "territories",
];

/// Supplies the raw text of named tables.
pub trait TableSource: Send + Sync + fmt::Debug {
    /// Names of all tables this source can provide, lower-cased.
    fn table_names(&self) -> Vec<String>;

    /// Fetches the raw delimited text of a table.
    fn fetch(&self, table: &str) -> LoadResult<String>;

    /// Returns true if the source provides the table.
    fn contains(&self, table: &str) -> bool {
        let table = table.to_ascii_lowercase();
        self.table_names().iter().any(|name| *name == table)
    }
}

/// Fetches `<base_url>/<table>.csv` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    tables: Vec<String>,
    /// Shared by every fetch. Built on first use, on the fetching thread:
    /// a blocking client must not be created on an async runtime thread.
    client: OnceLock<Client>,
}

impl HttpSource {
    /// Creates a source serving the given tables from a base URL.
    pub fn new<I, S>(base_url: impl Into<String>, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tables: tables
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
            client: OnceLock::new(),
        }
    }

    /// The Northwind sample data set.
    pub fn northwind() -> Self {
        Self::new(NORTHWIND_BASE_URL, NORTHWIND_TABLES.iter().copied())
    }

    /// The URL a table is fetched from.
    pub fn url(&self, table: &str) -> String {
        format!("{}/{}.csv", self.base_url, table)
    }

    fn client(&self, table: &str) -> LoadResult<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .user_agent(concat!("tabula/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LoadError::unavailable(table, e))?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl TableSource for HttpSource {
    fn table_names(&self) -> Vec<String> {
        self.tables.clone()
    }

    fn fetch(&self, table: &str) -> LoadResult<String> {
        let url = self.url(table);
        debug!(table = %table, url = %url, "Fetching table");

        let response = self
            .client(table)?
            .get(&url)
            .send()
            .map_err(|e| LoadError::unavailable(table, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::unavailable(
                table,
                format!("GET {} returned {}", url, status),
            ));
        }
        response.text().map_err(|e| LoadError::unavailable(table, e))
    }
}

/// Reads `<dir>/<table>.csv` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    tables: Vec<String>,
}

impl DirectorySource {
    /// Discovers every `*.csv` file in a directory.
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut tables = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tables.push(stem.to_ascii_lowercase());
            }
        }
        tables.sort();
        tables.dedup();
        Ok(Self { dir, tables })
    }

    /// Restricts the offered tables to those named in `tables` that were
    /// found in the directory.
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: Vec<String> = tables
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        self.tables.retain(|t| wanted.contains(t));
        self
    }

    /// The directory tables are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, table: &str) -> LoadResult<PathBuf> {
        let exact = self.dir.join(format!("{}.csv", table));
        if exact.is_file() {
            return Ok(exact);
        }
        // File names may differ in case from the lower-cased table name.
        let entries = std::fs::read_dir(&self.dir).map_err(|e| LoadError::unavailable(table, e))?;
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                    && path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(table))
            })
            .ok_or_else(|| LoadError::unavailable(table, format!("no file {}", exact.display())))
    }
}

impl TableSource for DirectorySource {
    fn table_names(&self) -> Vec<String> {
        self.tables.clone()
    }

    fn fetch(&self, table: &str) -> LoadResult<String> {
        let path = self.path(table)?;
        debug!(table = %table, path = %path.display(), "Reading table");
        std::fs::read_to_string(&path).map_err(|e| LoadError::unavailable(table, e))
    }
}

/// Serves tables from strings held in memory. Counts fetches, which makes
/// it useful for observing load behaviour.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, String>,
    fetches: AtomicUsize,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    pub fn with_table(mut self, name: &str, text: impl Into<String>) -> Self {
        self.tables.insert(name.to_ascii_lowercase(), text.into());
        self
    }

    /// Total number of fetches served, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TableSource for MemorySource {
    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn fetch(&self, table: &str) -> LoadResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tables
            .get(&table.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| LoadError::unavailable(table, "no such table"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_urls() {
        let source = HttpSource::new("http://localhost:9000/data/", ["Products"]);
        assert_eq!(source.url("products"), "http://localhost:9000/data/products.csv");
        assert!(source.contains("PRODUCTS"));
        assert!(!source.contains("orders"));
    }

    #[test]
    fn test_http_client_is_reused() {
        // A port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let source = HttpSource::new(format!("http://127.0.0.1:{}", port), ["products"]);
        assert!(source.client.get().is_none());

        let err = source.fetch("products").unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
        let first = source.client.get().unwrap() as *const Client;

        assert!(source.fetch("products").is_err());
        assert_eq!(source.client.get().unwrap() as *const Client, first);
    }

    #[test]
    fn test_northwind_tables() {
        let source = HttpSource::northwind();
        assert_eq!(source.table_names().len(), 10);
        assert!(source.contains("order_details"));
    }

    #[test]
    fn test_directory_discovery() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Products.csv"), "id\n1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.table_names(), vec!["products".to_string()]);
        assert_eq!(source.fetch("products").unwrap(), "id\n1\n");
        assert!(matches!(
            source.fetch("orders"),
            Err(LoadError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_directory_restricted_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.csv"), "id\n1\n").unwrap();
        std::fs::write(dir.path().join("orders.csv"), "id\n1\n").unwrap();

        let source = DirectorySource::open(dir.path())
            .unwrap()
            .with_tables(["Orders", "shippers"]);
        assert_eq!(source.table_names(), vec!["orders".to_string()]);
        assert!(!source.contains("products"));
    }

    #[test]
    fn test_memory_source_counts_fetches() {
        let source = MemorySource::new().with_table("Regions", "region_id\n1\n");
        assert_eq!(source.table_names(), vec!["regions".to_string()]);
        assert!(source.fetch("regions").is_ok());
        assert!(source.fetch("missing").is_err());
        assert_eq!(source.fetch_count(), 2);
    }
}
