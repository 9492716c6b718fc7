//! Core Error Types
//!
//! Errors raised by the data model itself. Provider and configuration
//! failures live in the crates that own them.

use thiserror::Error;

/// Core error type for the survey data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A name did not match any member of a closed enumeration
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
