//! Error types for bundle storage and resolution.

use std::path::PathBuf;

use stubcache_ast::LookupError;
use stubcache_common::InternalError;
use stubcache_parser::ParseError;

/// Errors that can occur while storing, loading or resolving a bundle.
///
/// Data errors (corrupt files, missing dependencies, bad source text) can be
/// reported and retried by the caller. [`CacheError::Internal`] signals a
/// broken invariant and is never recovered from.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a bundle file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A bundle has an invalid or missing header.
    #[error("invalid bundle header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the computed checksum of the payload.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The bundle format version does not match the current version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The format version this build reads.
        expected: u32,
        /// The format version found in the bundle.
        actual: u32,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A referenced name is not available in the module map.
    #[error("unresolved class: '{name}'")]
    UnresolvedDependency {
        /// The fully qualified name that could not be resolved.
        name: String,
    },

    /// Stub source text could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<LookupError> for CacheError {
    fn from(err: LookupError) -> Self {
        CacheError::UnresolvedDependency {
            name: err.name().to_string(),
        }
    }
}
