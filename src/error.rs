//! Error kinds and the diagnostic boundary type.
//!
//! Everything that can go wrong inside the mapper is one of the variants of
//! [`MapperError`]. At the boundary with the configuration engine, errors are
//! converted into [`Diagnostic`]s (severity + message + the remote path
//! involved); raw errors never cross that boundary.

use serde::Serialize;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MapperError>;

/// Failure classes surfaced by the mapper.
///
/// None of these are retried internally; retry policy, if any, belongs to the
/// HTTP client underneath.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A schema violation detected before any remote call: missing required
    /// field, block cardinality exceeded, unknown field, bad value shape.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
        path: Option<String>,
    },

    /// The remote API returned a failure status for the attempted path.
    #[error("remote API error at {path}: {message}")]
    Remote { path: String, message: String },

    /// A remote payload value could not be coerced to the declared field type.
    #[error("cannot decode field {field:?}: {message}")]
    Decode { field: String, message: String },

    /// A replace-triggering field changed; the caller must delete and
    /// recreate instead of updating in place. Not fatal by itself.
    #[error("field {field:?} cannot be changed in place; the resource must be replaced")]
    ReplacementRequired { field: String },

    /// Import target absent. Hard failure, unlike Read's drift handling.
    #[error("no resource found at {path}")]
    NotFound { path: String },
}

impl MapperError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MapperError::InvalidConfiguration {
            message: message.into(),
            path: None,
        }
    }

    pub(crate) fn remote(path: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError::Remote {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError::Decode {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Diagnostic severity reported to the configuration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Structured diagnostic handed to the configuration engine.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    /// The remote path involved, when one was known at failure time.
    pub path: Option<String>,
}

impl From<MapperError> for Diagnostic {
    fn from(err: MapperError) -> Self {
        let path = match &err {
            MapperError::InvalidConfiguration { path, .. } => path.clone(),
            MapperError::Remote { path, .. } | MapperError::NotFound { path } => {
                Some(path.clone())
            }
            MapperError::Decode { .. } | MapperError::ReplacementRequired { .. } => None,
        };
        Diagnostic {
            severity: Severity::Error,
            summary: err.to_string(),
            path,
        }
    }
}
