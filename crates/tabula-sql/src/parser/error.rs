//! Parse errors.

use thiserror::Error;

use super::lexer::Location;

/// Result type for parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while turning query text into a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The query contained nothing but whitespace and comments.
    #[error("empty query")]
    EmptyQuery,

    /// A character sequence that is not a valid token.
    #[error("{message} at line {line}, column {column}")]
    InvalidToken {
        /// What went wrong.
        message: String,
        /// Line of the offending text.
        line: usize,
        /// Column of the offending text.
        column: usize,
    },

    /// A token that does not fit the grammar at its position.
    #[error("unexpected {found} at line {line}, column {column}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token found.
        found: String,
        /// Description of what the grammar allows.
        expected: String,
        /// Line of the token.
        line: usize,
        /// Column of the token.
        column: usize,
    },

    /// The input ended in the middle of a statement.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// Description of what the grammar allows.
        expected: String,
    },

    /// Valid SQL that this engine does not implement.
    #[error("{feature} is not supported (line {line}, column {column})")]
    Unsupported {
        /// The unsupported construct.
        feature: String,
        /// Line of the construct.
        line: usize,
        /// Column of the construct.
        column: usize,
    },

    /// LIMIT or OFFSET with something other than a non-negative integer.
    #[error("{clause} must be a non-negative integer, found {found} at line {line}, column {column}")]
    InvalidLimit {
        /// `LIMIT` or `OFFSET`.
        clause: &'static str,
        /// The offending text.
        found: String,
        /// Line of the value.
        line: usize,
        /// Column of the value.
        column: usize,
    },
}

impl ParseError {
    pub(crate) fn invalid_token(message: impl Into<String>, at: Location) -> Self {
        ParseError::InvalidToken {
            message: message.into(),
            line: at.line,
            column: at.column,
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>, at: Location) -> Self {
        ParseError::Unsupported {
            feature: feature.into(),
            line: at.line,
            column: at.column,
        }
    }

    /// Line and column of the error, when it has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::InvalidToken { line, column, .. }
            | ParseError::UnexpectedToken { line, column, .. }
            | ParseError::Unsupported { line, column, .. }
            | ParseError::InvalidLimit { line, column, .. } => Some((*line, *column)),
            ParseError::EmptyQuery | ParseError::UnexpectedEnd { .. } => None,
        }
    }
}
