//! Error types for vcf2sql
//!
//! Every failure aborts the export run. The variants separate the three
//! fatal classes (schema definition, ingestion, storage) from plumbing
//! errors so the CLI can print one diagnostic naming the offending table or
//! record.

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for vcf2sql
#[derive(Error, Debug)]
pub enum ExportError {
    /// Invalid schema builder usage, detected before any row is written
    #[error("Schema definition error: {0}")]
    SchemaDefinition(String),

    /// Malformed or referentially inconsistent input
    #[error("Ingestion error at {context}: {message}")]
    Ingestion { context: String, message: String },

    /// Temporary staging resource or archive failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An orchestrator step was invoked out of order
    #[error("Invalid export state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },
}

impl ExportError {
    /// Create a schema definition error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaDefinition(msg.into())
    }

    /// Create an ingestion error located at `context` (a table or a record)
    pub fn ingestion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Prefix the location of an ingestion error with an outer context.
    ///
    /// Other variants are returned unchanged.
    pub fn within(self, outer: impl std::fmt::Display) -> Self {
        match self {
            Self::Ingestion { context, message } => Self::Ingestion {
                context: format!("{outer}: {context}"),
                message,
            },
            other => other,
        }
    }
}
