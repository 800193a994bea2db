//! Error types for Trellis
//!
//! All modules use `TrellisResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Trellis operations
pub type TrellisResult<T> = Result<T, TrellisError>;

/// All errors that can occur in Trellis
#[derive(Error, Debug)]
pub enum TrellisError {
    // Form builder errors
    #[error("Undefined operation `{operation}` for {builder}")]
    UnsupportedOperation { operation: String, builder: String },

    #[error("Invalid arguments for `{operation}`: {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("Unknown form builder: {0}")]
    UnknownBuilder(String),

    // Widget errors
    #[error("Accessor `{name}` failed: {reason}")]
    Accessor { name: String, reason: String },

    #[error("Widget {0} is not cacheable")]
    NotCacheable(String),

    #[error("Missing parameter for {widget}: {name}")]
    MissingAssign { widget: String, name: String },

    #[error("Unexpected parameter for {widget}: {name}")]
    UnexpectedAssign { widget: String, name: String },

    // Cache errors
    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    #[error("Failed to read cache entry {path}: {reason}")]
    CacheEntryRead { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrellisError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an accessor failure for a named static key
    pub fn accessor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Accessor {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-arguments error for a builder operation
    pub fn invalid_args(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownBuilder(_) => Some("Check [forms] default_builder in your config"),
            Self::ConfigInvalid { .. } => Some("Run: trellis config show"),
            Self::CacheEntryRead { .. } => Some("Run: trellis cache prune"),
            _ => None,
        }
    }
}
