//! Database error types.

use tabula_sql::executor::ExecutionError;
use tabula_sql::parser::ParseError;
use tabula_sql::storage::LoadError;
use thiserror::Error;

/// Message returned for requests that carry no usable query.
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query";

/// Message returned while the tables a query needs cannot be loaded.
pub const NOT_READY_MESSAGE: &str = "Database is not ready yet. Please try again later.";

/// Database errors.
///
/// The `Display` form of each variant is the message shown to clients.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The request did not contain a query.
    #[error("{0}")]
    InvalidRequest(String),

    /// The query is not valid SQL.
    #[error("SQL Error: {0}")]
    Parse(#[from] ParseError),

    /// The query failed while executing.
    #[error("SQL Error: {0}")]
    Execution(#[from] ExecutionError),

    /// A table the query needs could not be loaded.
    #[error("{}", NOT_READY_MESSAGE)]
    Load(#[from] LoadError),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl DatabaseError {
    /// Creates the error for a missing or empty query.
    pub fn invalid_query() -> Self {
        DatabaseError::InvalidRequest(INVALID_QUERY_MESSAGE.to_string())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            DatabaseError::InvalidRequest(_)
            | DatabaseError::Parse(_)
            | DatabaseError::Execution(_) => 400,
            DatabaseError::Load(_) => 503,
            DatabaseError::Internal(_) => 500,
        }
    }

    /// Returns true for failures of the query itself, as opposed to
    /// failures of the service.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Database result type.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
