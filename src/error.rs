//! ShieldGate error types

use thiserror::Error;

/// ShieldGate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (missing required fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Sanitization pipeline error
    #[error("Sanitize error: {0}")]
    Sanitize(String),

    /// Audit store error
    #[error("Audit error: {0}")]
    Audit(String),

    /// Session link error
    #[error("Session error: {0}")]
    Session(String),

    /// Telemetry/broadcast error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for ShieldGate operations
pub type Result<T> = std::result::Result<T, Error>;
