//! Query construction error types
//!
//! Error codes:
//! - DSQ_QUERY_INVALID (one or more clauses failed validation)
//! - DSQ_QUERY_TOO_MANY_COMBINATIONS (IN expansion exceeded the cap)
//!
//! Clause errors are collected before any query is emitted, so a run never
//! executes a partially built query.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for query construction
pub type QueryResult<T> = Result<T, QueryError>;

/// A single clause that failed type-specific validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ClauseError {
    /// Field of the offending clause
    pub field: String,
    /// What was wrong with its value
    pub message: String,
}

impl ClauseError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Query construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// At least one clause is invalid; nothing was built
    #[error("Invalid clauses: {}", JoinedErrors(.0))]
    InvalidClauses(Vec<ClauseError>),

    /// IN expansion produced more variants than allowed
    #[error("Too many query combinations: {count} exceeds the limit of {cap}")]
    TooManyCombinations { count: usize, cap: usize },
}

impl QueryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidClauses(_) => "DSQ_QUERY_INVALID",
            QueryError::TooManyCombinations { .. } => "DSQ_QUERY_TOO_MANY_COMBINATIONS",
        }
    }

    /// Clause errors carried by this error, if any
    pub fn clause_errors(&self) -> &[ClauseError] {
        match self {
            QueryError::InvalidClauses(errors) => errors,
            QueryError::TooManyCombinations { .. } => &[],
        }
    }
}

impl From<ClauseError> for QueryError {
    fn from(err: ClauseError) -> Self {
        QueryError::InvalidClauses(vec![err])
    }
}

struct JoinedErrors<'a>(&'a [ClauseError]);

impl fmt::Display for JoinedErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}
