use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("{0} requires an HTTP transport, but none is available")]
    TransportUnavailable(String),

    #[error("{0} upload returned no valid URL")]
    NoValidUrlReturned(String),

    #[error("{destination} upload failed: {message}")]
    DestinationInvocationFailed {
        destination: String,
        message: String,
    },

    #[error("Cached image data is missing, backup cannot run")]
    CacheMissing,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, MirrorError>;

/// Stable, serializable code for a [`MirrorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DestinationNotFound,
    TransportUnavailable,
    NoValidUrlReturned,
    DestinationInvocationFailed,
    CacheMissing,
    Transport,
    Config,
    Io,
    Json,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::DestinationNotFound => "destination_not_found",
            FailureKind::TransportUnavailable => "transport_unavailable",
            FailureKind::NoValidUrlReturned => "no_valid_url_returned",
            FailureKind::DestinationInvocationFailed => "destination_invocation_failed",
            FailureKind::CacheMissing => "cache_missing",
            FailureKind::Transport => "transport",
            FailureKind::Config => "config",
            FailureKind::Io => "io",
            FailureKind::Json => "json",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(e: std::io::Error) -> Self {
        MirrorError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(e: serde_json::Error) -> Self {
        MirrorError::Json(e.to_string())
    }
}

impl MirrorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MirrorError::DestinationNotFound(_) => FailureKind::DestinationNotFound,
            MirrorError::TransportUnavailable(_) => FailureKind::TransportUnavailable,
            MirrorError::NoValidUrlReturned(_) => FailureKind::NoValidUrlReturned,
            MirrorError::DestinationInvocationFailed { .. } => {
                FailureKind::DestinationInvocationFailed
            }
            MirrorError::CacheMissing => FailureKind::CacheMissing,
            MirrorError::Transport(_) => FailureKind::Transport,
            MirrorError::Config(_) => FailureKind::Config,
            MirrorError::Io(_) => FailureKind::Io,
            MirrorError::Json(_) => FailureKind::Json,
        }
    }

    /// Wrap an error raised by a destination's own upload handler.
    pub fn invocation(destination: &str, source: impl std::fmt::Display) -> Self {
        MirrorError::DestinationInvocationFailed {
            destination: destination.to_string(),
            message: source.to_string(),
        }
    }
}
