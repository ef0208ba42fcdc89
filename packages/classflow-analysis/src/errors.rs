//! Error types for classflow-analysis
//!
//! Provides unified error handling across the crate.
//!
//! Abstract-interpretation verdicts (divide by zero, out of bounds, ...) are
//! analysis results carried on states, never errors. This enum covers genuine
//! implementation faults only: bad configuration, missing methods, malformed
//! bytecode.

use thiserror::Error;

/// Main error type for classflow operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The bytecode collaborator could not supply a method body
    #[error("Bytecode error: {0}")]
    Bytecode(String),

    /// Structurally invalid bytecode (stack underflow, offset out of range)
    #[error("Malformed bytecode: {0}")]
    MalformedBytecode(String),

    /// Invocation input vector could not be abstracted
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Fixture / report serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AnalysisError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::Config(msg.into())
    }

    /// Create a bytecode lookup error
    pub fn bytecode(msg: impl Into<String>) -> Self {
        AnalysisError::Bytecode(msg.into())
    }

    /// Create a malformed-bytecode error
    pub fn malformed(msg: impl Into<String>) -> Self {
        AnalysisError::MalformedBytecode(msg.into())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for AnalysisError {
    fn from(e: serde_yaml::Error) -> Self {
        AnalysisError::Serialization(e.to_string())
    }
}

/// Result type alias for classflow operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
