//! Error types for Pageflow.
//!
//! All errors in Pageflow are represented by the `PageflowError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Pageflow operations.
///
/// Each variant represents a specific category of error that can occur
/// while compiling a logic graph or interpreting it at runtime.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum PageflowError {
    /// Engine-level errors (startup, shutdown, configuration).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON models, node payloads).
    #[error("{0}")]
    Convert(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// Logic graph compilation errors.
    #[error("{0}")]
    Graph(String),

    /// Node definition errors.
    #[error("{0}")]
    Node(String),

    /// Edge definition errors.
    #[error("{0}")]
    Edge(String),

    /// Node executor errors.
    #[error("{0}")]
    Executor(String),

    /// Outbound HTTP errors (fetch, lead submission).
    #[error("{0}")]
    Http(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),
}

impl From<PageflowError> for String {
    fn from(val: PageflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for PageflowError {
    fn from(error: std::io::Error) -> Self {
        PageflowError::IoError(error.to_string())
    }
}

impl From<PageflowError> for std::io::Error {
    fn from(val: PageflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for PageflowError {
    fn from(error: serde_json::Error) -> Self {
        PageflowError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for PageflowError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        PageflowError::Node(error.to_string())
    }
}

impl From<reqwest::Error> for PageflowError {
    fn from(error: reqwest::Error) -> Self {
        PageflowError::Http(error.to_string())
    }
}
