//! # Tabula query service
//!
//! This module wires the SQL engine to a table source and shapes its
//! output for clients:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Database                             │
//! │                                                               │
//! │  run_query(sql)                                               │
//! │     │                                                         │
//! │     ├─▶ validate ──▶ InvalidRequest (400)                     │
//! │     ├─▶ Parser ─────▶ ParseError    (400, "SQL Error: ...")   │
//! │     ├─▶ Catalog ────▶ LoadError     (503)                     │
//! │     ├─▶ QueryExecutor ▶ ExecutionError (400, "SQL Error: ...")│
//! │     └─▶ ResultFormatter ─▶ {columns, rows, executionTime}     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```ignore
//! use tabula_server::config::ServerConfig;
//! use tabula_server::database::Database;
//!
//! let db = Database::open(&ServerConfig::default())?;
//! let response = db.run_query("SELECT * FROM products LIMIT 5")?;
//! println!("{:?} ({} ms)", response.columns, response.execution_time);
//! ```

mod engine;
mod error;
mod result;

pub use engine::{Database, DatabaseConfig, DatabaseStats, LoadStrategy};
pub use error::{DatabaseError, DatabaseResult, INVALID_QUERY_MESSAGE, NOT_READY_MESSAGE};
pub use result::{round_millis, ErrorResponse, QueryResponse, ResultFormatter, StatusResponse};
