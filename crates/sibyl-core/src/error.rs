//! Error types for the Sibyl retrieval service.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the Sibyl retrieval service.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Embedding call failed or returned a mismatched shape.
    #[error("Embedding error: {message}")]
    Embedding {
        /// Error message.
        message: String,
    },

    /// Vector inserted with the wrong dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality declared by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// External generation call failed.
    #[error("Generation error: {message}")]
    Generation {
        /// Error message.
        message: String,
    },

    /// Persistent vector-store backend could not be constructed.
    #[error("Backend unavailable: {backend}: {message}")]
    BackendUnavailable {
        /// Backend identifier (collection name or path).
        backend: String,
        /// Error message.
        message: String,
    },

    /// External call exceeded its time budget.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// Duration before timeout.
        duration: Duration,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a configuration error with the given message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an embedding error with the given message.
    #[must_use]
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Creates a generation error with the given message.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Creates a backend-unavailable error.
    #[must_use]
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error is recoverable by backend fallback.
    #[must_use]
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}
