//! Error types for the pulse-cluster library.

use thiserror::Error;

/// Result type alias for clustering and analysis operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Errors that can occur while loading, clustering or reporting segments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Two signals must have the same length for the requested measure.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Similarity method name not recognized.
    #[error("unknown similarity method: {0}")]
    UnknownMethod(String),

    /// Dataset file extension is not supported by the loader.
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    /// No dataset key matches the requested signal type.
    #[error("no '{channel}' signal found, available keys: {available:?}")]
    MissingChannel {
        channel: String,
        available: Vec<String>,
    },

    /// The channel was found but no segment survived filtering.
    #[error("no usable '{channel}' segments in dataset")]
    NoSegments { channel: String },

    /// Malformed dataset content.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Filesystem failure.
    #[error("i/o error on {path}: {message}")]
    Io { path: String, message: String },

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClusterError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        ClusterError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClusterError {
    fn from(err: serde_json::Error) -> Self {
        ClusterError::Serialization(err.to_string())
    }
}
