//! # tabula-server
//!
//! Query service and HTTP server for the Tabula SQL playground.
//!
//! This crate provides:
//!
//! - **Database**: the query service. Validates a query string, loads the
//!   tables it references, runs it and shapes the result as
//!   `{columns, rows, executionTime}`. Used embedded by the terminal
//!   client and behind HTTP by `tabulad`.
//!
//! - **HTTP Server**: `POST /api/query`, `GET /api/status` and
//!   `GET /api/examples`.
//!
//! # Quick Start
//!
//! ```ignore
//! use tabula_server::config::ServerConfig;
//! use tabula_server::database::Database;
//!
//! let db = Database::open(&ServerConfig::default())?;
//! let response = db.run_query("SELECT category_name FROM categories")?;
//! for row in &response.rows {
//!     println!("{:?}", row);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// The query service.
pub mod database;

/// HTTP routes and server.
pub mod http;

/// Server configuration.
pub mod config;

/// Sample queries.
pub mod samples;

// Re-export commonly used types
pub use database::{
    Database, DatabaseConfig, DatabaseError, DatabaseResult, DatabaseStats, LoadStrategy,
    QueryResponse, StatusResponse,
};
