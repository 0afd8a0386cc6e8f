//! Passes over declaration trees.
//!
//! Read-only passes implement [`Visitor`](crate::Visitor); rewriting passes
//! implement [`Transform`](crate::Transform). Together they cover dependency
//! collection, pointer bookkeeping for class references, name resolution
//! against builtins, the module itself and other loaded modules, and the
//! normalizations applied before a tree is exported.

mod builtins;
mod dependencies;
mod late;
mod local;
mod lookup;
mod named;
mod ordering;
mod pointers;
mod type_params;

pub use builtins::{ExpandCompatibleBuiltins, LookupBuiltins};
pub use dependencies::CollectDependencies;
pub use late::ClassTypeToLateType;
pub use local::LookupLocalTypes;
pub use lookup::LookupExternalTypes;
pub use named::NamedTypeToClassType;
pub use ordering::CanonicalOrdering;
pub use pointers::{ClearClassPointers, FillLocalPointers, FindClassTypes};
pub use type_params::AdjustTypeParameters;

/// Splits a dotted name into `(module, member)` at the last separator.
pub(crate) fn split_name(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
}
