// ============================================================================
// spark-state - Errors
// ============================================================================
//
// Addressing misses (absent keys, out-of-range indices, paths that cross a
// scalar) are never errors: reads return a default and writes return the
// receiver. Errors only arise at the typed edges of the crate: extracting
// a Rust type from a `Value`, parsing a textual path, or JSON text.
// ============================================================================

use thiserror::Error;

/// Errors raised by the conversion and parsing edges of the crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A `Value` did not hold the kind the caller asked for
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A textual path could not be parsed
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// JSON text could not be read or written
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error is a type mismatch
    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }

    /// Check if this error came from path parsing
    pub fn is_path_error(&self) -> bool {
        matches!(self, Error::InvalidPath { .. })
    }

    /// Check if this error came from serde_json
    pub fn is_json_error(&self) -> bool {
        matches!(self, Error::Json(_))
    }

    /// The offending path, for path errors
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
