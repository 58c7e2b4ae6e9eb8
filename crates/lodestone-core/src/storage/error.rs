//! # Lodestone Storage Errors
//!
//! Defines error types for the storage subsystem.
//!
//! This module includes [`StorageError`], the primary enum encompassing
//! various errors that can occur during storage operations: file I/O,
//! path resolution, config parsing, backend selection, and embedded
//! database failures.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization to '{format}' failed: {source}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    Deserialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Malformed config document at line {line}: {reason}")]
    MalformedDocument { line: usize, reason: String },

    #[error("Unsupported data file extension for path: {0} (expected .json or .sqlite)")]
    UnsupportedExtension(PathBuf),

    #[error("World-scoped data file '{file}' requires a world name")]
    MissingWorldName { file: String },

    #[error("Database error during operation '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage operation '{operation}' failed for path '{}': {message}", path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<unknown>".into()))]
    OperationFailed {
        operation: String,
        path: Option<PathBuf>,
        message: String,
    },
}

// Helpers for creating errors with context attached.
impl StorageError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub fn database(source: rusqlite::Error, operation: impl Into<String>) -> Self {
        StorageError::Database {
            source,
            operation: operation.into(),
        }
    }
}

/// Shorthand for Result with the storage error type
pub type Result<T> = std::result::Result<T, StorageError>;
