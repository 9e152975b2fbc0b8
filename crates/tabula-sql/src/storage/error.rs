//! Load error types.

use thiserror::Error;

/// Errors raised while fetching or decoding a table.
///
/// Cloneable so that every caller waiting on a shared load receives the
/// same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The source could not provide the table's text.
    #[error("table {table} is unavailable: {reason}")]
    SourceUnavailable {
        /// Table name.
        table: String,
        /// Underlying cause.
        reason: String,
    },

    /// The text was fetched but is not well-formed delimited data.
    #[error("malformed record in table {table} at line {line}: {reason}")]
    MalformedRecord {
        /// Table name.
        table: String,
        /// 1-based line of the offending record.
        line: u64,
        /// What is wrong with the record.
        reason: String,
    },
}

impl LoadError {
    /// Creates a source failure.
    pub fn unavailable(table: impl Into<String>, reason: impl ToString) -> Self {
        LoadError::SourceUnavailable {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// The table the error is about.
    pub fn table(&self) -> &str {
        match self {
            LoadError::SourceUnavailable { table, .. } | LoadError::MalformedRecord { table, .. } => {
                table
            }
        }
    }
}

/// Load result type.
pub type LoadResult<T> = Result<T, LoadError>;
