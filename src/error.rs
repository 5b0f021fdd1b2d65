//! Error types for Fryer
//!
//! All modules use `FryerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Fryer operations
pub type FryerResult<T> = Result<T, FryerError>;

/// All errors that can occur in Fryer
#[derive(Error, Debug)]
pub enum FryerError {
    // Configuration errors
    #[error("Unknown checksum algorithm: {0}")]
    UnknownChecksumAlgorithm(String),

    #[error("Unknown archive extension for {url}: {extension}")]
    UnknownExtension { url: String, extension: String },

    #[error("Unknown flavour: {0}")]
    UnknownFlavour(String),

    #[error("Invalid source URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid recipe at {path}: {reason}")]
    RecipeInvalid { path: PathBuf, reason: String },

    // Cache errors
    #[error("Unable to fetch file {url}: HTTP {status} {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Unable to fetch file {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Too many redirects fetching {url}")]
    TooManyRedirects { url: String },

    #[error("Checksum failed for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to write cache file {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache for {url} is unavailable after an earlier failure: {reason}")]
    CacheUnavailable { url: String, reason: String },

    #[error("Cache for {0} has not been validated yet")]
    CacheNotReady(String),

    // Build errors
    #[error("Image build failed: {0}")]
    BuildFailed(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FryerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Raised eagerly while building descriptors or rendering; never worth retrying
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownChecksumAlgorithm(_)
                | Self::UnknownExtension { .. }
                | Self::UnknownFlavour(_)
                | Self::InvalidUrl { .. }
                | Self::ConfigInvalid { .. }
                | Self::RecipeInvalid { .. }
        )
    }

    /// Check if error is a cache failure (redirect errors included)
    pub fn is_cache_failure(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. }
                | Self::Transport { .. }
                | Self::TooManyRedirects { .. }
                | Self::ChecksumMismatch { .. }
                | Self::CacheWrite { .. }
                | Self::CacheUnavailable { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownChecksumAlgorithm(_) => {
                Some("Use a sha256 (64 hex chars) or sha1 (40 hex chars) checksum")
            }
            Self::UnknownExtension { .. } => Some(
                "Set source.extension to one of .tar, .tar.gz, .tgz, .tar.bz2, .zip, .bin, .bundle",
            ),
            Self::UnknownFlavour(_) => Some("Pass --flavour debian or --flavour redhat"),
            Self::ChecksumMismatch { .. } => {
                Some("The remote file changed or the recipe checksum is wrong")
            }
            Self::TooManyRedirects { .. } => Some("Point the recipe at the final download URL"),
            _ => None,
        }
    }
}
