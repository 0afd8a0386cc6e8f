//! Parsing and validation of `stubcache.toml` configuration files.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`StubcacheConfig`] with the cache directory, the language
//! version used to evaluate stub conditionals, the namespaces kept resolved on
//! export and an optional custom builtins stub.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
