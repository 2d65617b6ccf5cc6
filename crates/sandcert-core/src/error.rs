//! Error types for sandcert.
//!
//! Every failure in the discovery, extraction and install pipeline maps onto one
//! variant of [`SandcertError`]. Only [`SandcertError::InvalidEnvelope`] and
//! [`SandcertError::DestinationUnavailable`] are ever handled without aborting
//! the run; everything else is fatal.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using SandcertError as the error type.
pub type Result<T> = std::result::Result<T, SandcertError>;

/// Top-level error type for all sandcert operations.
#[derive(Debug, Error)]
pub enum SandcertError {
    /// The source directory does not exist or is not a directory
    #[error("Sandcats certificate directory {} doesn't exist or is not a directory", path.display())]
    SourceUnavailable { path: PathBuf },

    /// The destination directory does not exist or is not a directory
    #[error("Destination directory {} doesn't exist or is not a directory", path.display())]
    DestinationUnavailable { path: PathBuf },

    /// A file in the source directory does not carry a numeric identifier
    #[error("Unexpected file in certificate directory, name is not numeric: {}", path.display())]
    MalformedIdentifier { path: PathBuf },

    /// A JSON envelope could not be read, parsed, or lacks a usable `cert`
    #[error("Invalid certificate envelope {}: {reason}", path.display())]
    InvalidEnvelope { path: PathBuf, reason: String },

    /// No identifier has both an envelope and a private key
    #[error("No valid certificate pair was found in {}", path.display())]
    NoValidPairFound { path: PathBuf },

    /// A remote locator is not in `container/path` form
    #[error("Invalid remote locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The remote pull command failed
    #[error("Remote pull of '{locator}' failed: {reason}")]
    RemotePull { locator: String, reason: String },

    /// The reverse proxy restart command failed
    #[error("Restart command '{command}' failed: {reason}")]
    RestartFailed { command: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors, tagged with the path being accessed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SandcertError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates an invalid envelope error.
    pub fn invalid_envelope(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Creates a remote pull error.
    pub fn remote_pull(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemotePull {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Creates a restart failure error.
    pub fn restart_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RestartFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to configuration.
///
/// These errors occur when loading, parsing, or validating configuration files
/// and command-line options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Neither a local nor a remote source was configured
    #[error("No certificate source configured, use a local or an LXD origin directory")]
    NoSource,

    /// Both a local and a remote source were configured
    #[error("Both a local and an LXD origin directory were configured, pick one")]
    ConflictingSources,
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
