//! Extraction error types
//!
//! Errors are split by how the stream runner reacts to them:
//! configuration errors abort the run before any extraction I/O, while
//! shape, adapter and sink errors raised mid-extraction trigger the
//! checkpoint fallback.

use crate::client::ClientError;
use crate::sink::SinkError;
use thiserror::Error;

/// Invalid run configuration, detected before extraction starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Dimension name outside the allowed set
    #[error("unknown dimension: '{0}'")]
    UnknownDimension(String),

    /// Allow-listed site that the account cannot extract
    #[error("site_url '{site_url}' not in the list of verified site_urls: {valid:?}")]
    UnverifiedSite {
        site_url: String,
        valid: Vec<String>,
    },

    /// Persisted bookmark that is not a `YYYY-MM-DD` date
    #[error("invalid checkpoint '{value}' for stream '{stream_id}': expected YYYY-MM-DD")]
    InvalidCheckpoint { stream_id: String, value: String },
}

/// Malformed backend response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Row key count differs from the stream's dimension count
    #[error("row has {actual} key values but the stream has {expected} dimensions")]
    DimensionCount { expected: usize, actual: usize },

    /// Date probe returned a key that is not a date
    #[error("invalid date key: '{0}'")]
    InvalidDate(String),
}

/// Any error raised while running a stream
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] ClientError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl ExtractError {
    /// Whether the error must abort the whole process instead of falling back
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExtractError::Configuration(_))
    }
}

/// Result type alias for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
