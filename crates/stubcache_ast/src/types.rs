//! Type expressions appearing in declarations.
//!
//! Every composite variant of [`Type`] wraps its payload in an `Arc` so that
//! rewriting passes can hand back the very same allocation when nothing
//! changed. [`Type::is_same`] checks that identity.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use serde::{Deserialize, Serialize};

use crate::decl::{Class, TypeParameter};

/// A type expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// The top type (`Any`).
    Anything,
    /// The bottom type (`NoReturn`).
    Nothing,
    /// A name straight out of the parser, not yet classified.
    Named(Arc<NamedType>),
    /// A reference to a class declaration, possibly resolved.
    Class(Arc<ClassType>),
    /// A name-only reference kept lazy for re-export.
    Late(Arc<LateType>),
    /// A use of a type parameter.
    Param(Arc<TypeParameter>),
    /// A parameterized type such as `list[int]`.
    Generic(Arc<GenericType>),
    /// A union of alternatives.
    Union(Arc<UnionType>),
}

impl Type {
    /// Creates an unclassified name.
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(Arc::new(NamedType { name: name.into() }))
    }

    /// Creates an unresolved class reference.
    pub fn class(name: impl Into<String>) -> Self {
        Type::Class(Arc::new(ClassType::new(name)))
    }

    /// Creates a lazy name-only reference.
    pub fn late(name: impl Into<String>) -> Self {
        Type::Late(Arc::new(LateType { name: name.into() }))
    }

    /// Creates a parameterized type.
    pub fn generic(base: Type, parameters: Vec<Type>) -> Self {
        Type::Generic(Arc::new(GenericType { base, parameters }))
    }

    /// Builds a union, flattening nested unions and dropping duplicates.
    ///
    /// An empty input yields [`Type::Nothing`] and a single alternative is
    /// returned as is.
    pub fn union(types: impl IntoIterator<Item = Type>) -> Self {
        let mut flat: Vec<Type> = Vec::new();
        for ty in types {
            match ty {
                Type::Union(u) => {
                    for inner in &u.types {
                        if !flat.contains(inner) {
                            flat.push(inner.clone());
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => Type::Nothing,
            1 => flat.remove(0),
            _ => Type::Union(Arc::new(UnionType { types: flat })),
        }
    }

    /// Returns `true` if both values are the same node (or the same leaf).
    pub fn is_same(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Anything, Type::Anything) | (Type::Nothing, Type::Nothing) => true,
            (Type::Named(a), Type::Named(b)) => Arc::ptr_eq(a, b),
            (Type::Class(a), Type::Class(b)) => Arc::ptr_eq(a, b),
            (Type::Late(a), Type::Late(b)) => Arc::ptr_eq(a, b),
            (Type::Param(a), Type::Param(b)) => Arc::ptr_eq(a, b),
            (Type::Generic(a), Type::Generic(b)) => Arc::ptr_eq(a, b),
            (Type::Union(a), Type::Union(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Returns the referenced name for name-carrying variants.
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Named(n) => Some(&n.name),
            Type::Class(c) => Some(&c.name),
            Type::Late(l) => Some(&l.name),
            Type::Param(p) => Some(&p.name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Anything => write!(f, "Any"),
            Type::Nothing => write!(f, "NoReturn"),
            Type::Named(n) => write!(f, "{}", n.name),
            Type::Class(c) => write!(f, "{}", c.name),
            Type::Late(l) => write!(f, "{}", l.name),
            Type::Param(p) => write!(f, "{}", p.name),
            Type::Generic(g) => {
                write!(f, "{}[", g.base)?;
                for (i, p) in g.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, "]")
            }
            Type::Union(u) => {
                for (i, t) in u.types.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}

/// A bare name produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedType {
    /// The name as written, possibly dotted.
    pub name: String,
}

/// A name kept unresolved on purpose so it can be resolved by whoever
/// imports the exported tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateType {
    /// The fully qualified name.
    pub name: String,
}

/// A parameterized type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericType {
    /// The generic class, usually a [`Type::Class`].
    pub base: Type,
    /// The type arguments.
    pub parameters: Vec<Type>,
}

/// A union of alternatives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    /// The alternatives, flattened and free of duplicates.
    pub types: Vec<Type>,
}

/// A reference to a class by fully qualified name.
///
/// The target slot holds a non-owning link to the class declaration. It can
/// be written once per node; clearing it means replacing the node. Two class
/// references compare equal when their names match, whatever their target.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClassType {
    /// Fully qualified class name, e.g. `pkg.mod.Foo`.
    pub name: String,
    #[serde(skip)]
    target: OnceLock<Weak<Class>>,
}

impl ClassType {
    /// Creates an unresolved reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: OnceLock::new(),
        }
    }

    /// Creates a reference already linked to `cls`.
    pub fn resolved(name: impl Into<String>, cls: &Arc<Class>) -> Self {
        let node = Self::new(name);
        node.set_cls(cls);
        node
    }

    /// Returns a copy with a different name and the same target.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: self.target.clone(),
        }
    }

    /// Returns `true` once the target slot has been written.
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Returns the linked class if it is set and still alive.
    pub fn cls(&self) -> Option<Arc<Class>> {
        self.target.get().and_then(Weak::upgrade)
    }

    /// Links this reference to `cls`. Returns `false` if it was already set.
    pub fn set_cls(&self, cls: &Arc<Class>) -> bool {
        self.target.set(Arc::downgrade(cls)).is_ok()
    }

    /// Returns `true` if the target is exactly the given allocation.
    pub fn points_to(&self, cls: &Arc<Class>) -> bool {
        self.target
            .get()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(cls)))
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassType {}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
