//! Session errors

use thiserror::Error;

use crate::query::QueryError;

/// Failure reported by an external collaborator (executor, lookup, store)
///
/// The message is opaque and surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors of one browse run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Clauses were rejected before anything was executed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A query variant failed; the whole run failed
    #[error("Query execution failed: {0}")]
    Execution(CollaboratorError),

    /// The batched key lookup failed
    #[error("Key lookup failed: {0}")]
    Lookup(CollaboratorError),

    /// Draft or history persistence failed
    #[error("Store error: {0}")]
    Store(String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Query(err) => err.code(),
            SessionError::Execution(_) => "DSQ_EXECUTION_FAILED",
            SessionError::Lookup(_) => "DSQ_LOOKUP_FAILED",
            SessionError::Store(_) => "DSQ_STORE_FAILED",
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_message_is_verbatim() {
        let err = CollaboratorError::new("deadline exceeded");
        assert_eq!(err.to_string(), "deadline exceeded");
        assert_eq!(
            SessionError::Execution(err).to_string(),
            "Query execution failed: deadline exceeded"
        );
    }

    #[test]
    fn test_query_error_code_passes_through() {
        let err: SessionError = QueryError::TooManyCombinations { count: 60, cap: 50 }.into();
        assert_eq!(err.code(), "DSQ_QUERY_TOO_MANY_COMBINATIONS");
    }
}
