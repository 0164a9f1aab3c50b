//! Value model error types
//!
//! Error codes:
//! - DSQ_VALUE_INVALID (inline, attributed to the edited value)
//! - DSQ_VALUE_UNKNOWN_VARIANT (invariant violation at the wire boundary)

use thiserror::Error;

/// Result type for value model operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Value model errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Text or wire data could not be parsed for the requested type
    #[error("Invalid value: {0}")]
    Validation(String),

    /// A wire value carried no recognized variant tag
    #[error("Unknown value variant: {0}")]
    UnknownVariant(String),
}

impl ValueError {
    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        ValueError::Validation(reason.into())
    }

    /// Create an unknown variant error
    pub fn unknown_variant(detail: impl Into<String>) -> Self {
        ValueError::UnknownVariant(detail.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::Validation(_) => "DSQ_VALUE_INVALID",
            ValueError::UnknownVariant(_) => "DSQ_VALUE_UNKNOWN_VARIANT",
        }
    }

    /// Unknown variants indicate a programming error, not bad user input
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ValueError::UnknownVariant(_))
    }
}
