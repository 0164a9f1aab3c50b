//! CLI-specific error types
//!
//! `CliError` is fatal: the process prints it to stderr and exits non-zero.
//! `RequestError` is answered on stdout as an error response line.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::aggregate::UnknownAggregation;
use crate::query::QueryError;
use crate::session::{CollaboratorError, SessionError};
use crate::value::ValueError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DSQ_CLI_CONFIG_ERROR",
            Self::IoError => "DSQ_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// A request that was read but could not be served
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RequestError {
    code: &'static str,
    message: String,
}

impl RequestError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Request JSON did not have the expected shape
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new("DSQ_CLI_INVALID_REQUEST", msg)
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_request(e.to_string())
    }
}

impl From<ValueError> for RequestError {
    fn from(e: ValueError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<QueryError> for RequestError {
    fn from(e: QueryError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<SessionError> for RequestError {
    fn from(e: SessionError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

impl From<CollaboratorError> for RequestError {
    fn from(e: CollaboratorError) -> Self {
        SessionError::Lookup(e).into()
    }
}

impl From<UnknownAggregation> for RequestError {
    fn from(e: UnknownAggregation) -> Self {
        Self::new("DSQ_AGGREGATE_UNKNOWN", e.to_string())
    }
}

/// Result of serving one request
pub type RequestResult<T> = Result<T, RequestError>;
