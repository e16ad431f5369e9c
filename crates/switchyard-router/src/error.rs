//! Registration-time errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, loading or persisting a route table.
///
/// All of these are fatal at start-up: a route that cannot be parsed or
/// compiled must never be deferred to the first request.
#[derive(Error, Debug)]
pub enum RouteError {
    /// The route definition string could not be parsed.
    #[error("malformed route definition '{definition}': {reason}")]
    Malformed {
        /// The offending definition.
        definition: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The pattern engine rejected the compiled matcher.
    #[error("failed to compile route pattern '{pattern}': {source}")]
    Compilation {
        /// The generated pattern source.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A route source file is invalid.
    #[error("invalid route source {path}: {reason}")]
    Source {
        /// The source file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The route table could not be serialized.
    #[error("failed to serialize route table: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RouteError {
    /// Creates a malformed-definition error.
    #[must_use]
    pub fn malformed(definition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            definition: definition.into(),
            reason: reason.into(),
        }
    }

    /// Creates a route source error.
    #[must_use]
    pub fn source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Source {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error bound to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
