//! Shared foundational types used across the stubcache workspace.
//!
//! This crate provides the internal error type used for invariant violations
//! and the language version tag that selects conditional stub declarations.

#![warn(missing_docs)]

pub mod result;
pub mod version;

pub use result::{InternalError, StubResult};
pub use version::{ParseVersionError, PythonVersion};
