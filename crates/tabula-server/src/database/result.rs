//! Query responses.

use std::time::Duration;

use serde::Serialize;
use tabula_sql::executor::{QueryResult, Value};
use tabula_sql::storage::CatalogStatus;

/// Successful answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Output column names.
    pub columns: Vec<String>,
    /// Output rows, positional and aligned to `columns`.
    pub rows: Vec<Vec<Value>>,
    /// Parse and execution time in whole milliseconds.
    pub execution_time: u64,
}

impl QueryResponse {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Client-facing message.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Readiness of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// True once tables are loaded and nothing is loading or failed.
    pub ready: bool,
    /// Why the service is not ready, if it is not.
    pub message: Option<String>,
}

impl From<CatalogStatus> for StatusResponse {
    fn from(status: CatalogStatus) -> Self {
        Self {
            ready: status.is_ready(),
            message: status.message(),
        }
    }
}

/// Turns engine results into responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter {
    /// Report the column list even when no rows were produced. When unset,
    /// an empty result has no columns either.
    pub keep_header_on_empty: bool,
}

impl ResultFormatter {
    /// Creates a formatter.
    pub fn new(keep_header_on_empty: bool) -> Self {
        Self {
            keep_header_on_empty,
        }
    }

    /// Builds a response from an engine result and the time it took.
    ///
    /// Every row is padded with NULLs or cut to the width of the column
    /// list.
    pub fn format(&self, result: QueryResult, elapsed: Duration) -> QueryResponse {
        let QueryResult { columns, rows } = result;
        let columns = if rows.is_empty() && !self.keep_header_on_empty {
            Vec::new()
        } else {
            columns
        };
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        QueryResponse {
            columns,
            rows,
            execution_time: round_millis(elapsed),
        }
    }
}

/// Rounds a duration to the nearest whole millisecond.
pub fn round_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}
