//! Error types for the Netwarden service.

use thiserror::Error;

/// Errors raised by rule store mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule with this id is already stored
    #[error("rule already exists: {0}")]
    DuplicateId(String),

    /// No rule with this id is stored
    #[error("rule not found: {0}")]
    NotFound(String),
}

/// Main error type for Netwarden operations.
#[derive(Error, Debug)]
pub enum NetwardenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rule management errors
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Netwarden operations.
pub type Result<T> = std::result::Result<T, NetwardenError>;
