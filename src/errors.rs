//! Error types for MODIS Fetcher
//!
//! This module defines the error types for all components of the library.
//! Catalog lookups, transport failures and configuration problems each get
//! their own enum, and `AppError` unifies them for callers that do not care.

use std::path::PathBuf;
use thiserror::Error;

/// Catalog level a lookup was performed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Collection,
    Product,
    Year,
    Day,
    Image,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NodeKind::Collection => "collection",
            NodeKind::Product => "product",
            NodeKind::Year => "year",
            NodeKind::Day => "day",
            NodeKind::Image => "image",
        };
        f.write_str(label)
    }
}

/// HTTP transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Token could not be encoded as a header value
    #[error("Invalid authorization header value")]
    InvalidHeader,

    /// Rate limit configuration rejected
    #[error("Rate limit must be non-zero")]
    InvalidRateLimit,

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Catalog navigation and search errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Requested key absent after loading the listing
    #[error("{kind} not found: {name}")]
    NotFound { kind: NodeKind, name: String },

    /// Day-of-year range end precedes its start
    #[error("Invalid day range: end day {end} precedes start day {start}")]
    InvalidRange { start: u32, end: u32 },

    /// Tile coordinates outside the sinusoidal grid
    #[error(
        "Invalid tile position h{horizontal} v{vertical}: horizontal must be 0-35, vertical 0-17"
    )]
    InvalidPosition { horizontal: i32, vertical: i32 },

    /// Image or directory name does not follow the archive naming convention
    #[error("Cannot parse '{name}': {reason}")]
    Parse { name: String, reason: String },

    /// Date argument is not a valid YYYY-MM-DD date
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// Search query combines filters in an unsupported way
    #[error("Invalid search query: {reason}")]
    InvalidQuery { reason: String },

    /// Listing payload does not have the expected shape
    #[error("Unexpected listing payload from {url}: {reason}")]
    UnexpectedPayload { url: String, reason: String },

    /// Underlying transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CatalogError {
    pub(crate) fn not_found(kind: NodeKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means "absent" rather than "broken"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No platform configuration directory
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Check if the error is transient and worth retrying by the caller
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Transport(e) | AppError::Catalog(CatalogError::Transport(e)) => {
                match e {
                    TransportError::Http(err) => err.is_timeout() || err.is_connect(),
                    TransportError::Status { status, .. } => *status == 429 || *status >= 500,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Catalog(CatalogError::Transport(_)) | AppError::Transport(_) => "transport",
            AppError::Catalog(_) => "catalog",
            AppError::Config(_) => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
