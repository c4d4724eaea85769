//! Error types for the imgsort classification and relocation engine.
//!
//! Run-level errors (`SortError`, `ConfigError`) stop a run before any file is
//! touched. Per-file errors (`ProbeError`, `RelocateError`) are recorded in the
//! run report and never abort the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for imgsort operations.
#[derive(Error, Debug)]
pub enum SortError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The destination root could not be created or is not a directory
    #[error("Cannot prepare destination root {path}: {message}")]
    DestinationRoot { path: PathBuf, message: String },

    /// The input root does not exist or cannot be read
    #[error("Cannot read input root {path}: {message}")]
    InputRoot { path: PathBuf, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse a JSON configuration
    #[error("Failed to parse JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failure to read header-level metadata from a source file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The file cannot be opened, is not a recognised image container,
    /// or its header is malformed or truncated.
    #[error("Unreadable image {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Failure to move or copy a file into its destination.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelocateError {
    /// A destination directory or file could not be created
    #[error("Destination unwritable {path}: {reason}")]
    DestinationUnwritable { path: PathBuf, reason: String },

    /// The source file disappeared before it could be transferred
    #[error("Source vanished: {0}")]
    SourceVanished(PathBuf),

    /// The copied file did not match the source; the partial copy was removed
    #[error("Copy verification failed for {path}: {reason}")]
    CopyVerificationFailed { path: PathBuf, reason: String },
}

impl RelocateError {
    /// Whether another transfer attempt could succeed.
    ///
    /// A vanished source will not come back, everything else may be a
    /// transient I/O condition.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::SourceVanished(_))
    }
}

/// Convenience type alias for imgsort results.
pub type Result<T> = std::result::Result<T, SortError>;
