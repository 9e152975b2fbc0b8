//! Execution errors.

use thiserror::Error;

/// Result type for query execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Semantic and runtime errors raised while executing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A referenced table or qualifier does not exist.
    #[error("no such table: {0}")]
    TableNotFound(String),

    /// A referenced column does not exist.
    #[error("no such column: {0}")]
    ColumnNotFound(String),

    /// An unqualified column name matches more than one table.
    #[error("ambiguous column name: {0}")]
    AmbiguousColumn(String),

    /// An operator or function was applied to values it cannot handle.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A grouped query selects a column that varies within a group.
    #[error("column {0} must appear in the GROUP BY clause or be used in an aggregate function")]
    UngroupedColumn(String),

    /// An aggregate appears where aggregates are not allowed.
    #[error("aggregate functions are not allowed in {0}")]
    MisplacedAggregate(String),

    /// A WHERE, ON or HAVING predicate produced a non-boolean value.
    #[error("argument of {clause} must be a boolean, found {found}")]
    NonBooleanPredicate {
        /// The clause holding the predicate.
        clause: &'static str,
        /// The kind of value produced.
        found: &'static str,
    },

    /// A call to a function that does not exist.
    #[error("no such function: {0}")]
    UnknownFunction(String),

    /// A function or clause received an argument it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
