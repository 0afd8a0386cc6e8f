//! Cache bundles for module declaration trees.
//!
//! This crate stores [`Unit`](stubcache_ast::Unit) trees as self-contained
//! bundles and restores them against a map of already loaded modules:
//!
//! - **Store**: [`store_ast`] renames package initializers, records the
//!   modules a tree depends on, strips resolved class pointers and indexes
//!   the class references before handing the bundle to the codec.
//! - **Load**: [`load_bundle`] decodes a bundle, [`ensure_ast_name`] moves it
//!   to the name it is loaded under, and [`resolve`] links its references,
//!   first into other modules and then into the module itself.
//! - **Export**: [`prepare_for_export`] normalizes a tree into the form a
//!   fresh load of its printed source would produce.
//!
//! Bundle files start with a small header (magic bytes, format version, tool
//! version and payload checksum) so stale or corrupt files are rejected before
//! the payload is decoded.

#![warn(missing_docs)]

pub mod bundle;
pub mod codec;
pub mod error;
pub mod export;
pub mod loader;
pub mod rename;
pub mod serialize;

pub use bundle::CacheBundle;
pub use codec::{
    decode_bundle, encode_bundle, load_bundle, write_bundle, BundleHeader, PayloadChecksum,
};
pub use error::CacheError;
pub use export::{prepare_for_export, prepare_for_export_with, DEFAULT_PROTECTED_NAMESPACES};
pub use loader::{load_source, Loader, SourceLoader};
pub use rename::RenameModule;
pub use serialize::{
    ensure_ast_name, fill_local_references, lookup_class_references, prepare_bundle, resolve,
    store_ast,
};
