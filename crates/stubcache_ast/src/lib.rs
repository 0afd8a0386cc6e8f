//! Declaration trees for module interfaces.
//!
//! A [`Unit`] describes the public surface of one module: its classes,
//! functions, constants, aliases and type parameters. Trees are immutable and
//! structurally shared through `Arc`; rewriting passes implement
//! [`Transform`] and return the original `Arc` for every subtree they leave
//! alone, so identity equality doubles as a cheap "unchanged" check.
//!
//! Class references ([`ClassType`]) carry a name and a write-once, non-owning
//! link to the class declaration they resolve to. The passes in [`passes`]
//! collect, clear, resolve and demote those links.

#![warn(missing_docs)]

pub mod decl;
pub mod error;
pub mod passes;
pub mod transform;
pub mod types;
pub mod unit;
pub mod visit;

pub use decl::{
    Alias, Class, Constant, Function, MethodKind, ParamKind, Parameter, Signature, TypeParameter,
};
pub use error::LookupError;
pub use transform::Transform;
pub use types::{ClassType, GenericType, LateType, NamedType, Type, UnionType};
pub use unit::{LocalModules, Member, ModuleLookup, ModuleMap, Unit};
pub use visit::Visitor;
