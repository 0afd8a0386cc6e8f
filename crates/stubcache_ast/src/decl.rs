//! Declaration nodes: classes, functions, constants, aliases and type
//! parameters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// A type variable, either declared at module level or used inside a
/// signature or class template.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParameter {
    /// Bare name, e.g. `T`.
    pub name: String,
    /// Qualified name of the declaration that binds this parameter
    /// (`mod.f`, `mod.C` or `mod.C.method`), if known.
    pub scope: Option<String>,
}

impl TypeParameter {
    /// Creates an unscoped type parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
        }
    }

    /// Creates a type parameter bound to `scope`.
    pub fn scoped(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Some(scope.into()),
        }
    }
}

/// How a parameter binds arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// A positional-or-keyword parameter.
    Normal,
    /// `*args`.
    VarArgs,
    /// `**kwargs`.
    KwArgs,
}

/// A single function parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Declared type; [`Type::Anything`] when unannotated.
    pub ty: Type,
    /// Binding kind.
    pub kind: ParamKind,
    /// Whether the parameter has a default value.
    pub optional: bool,
}

impl Parameter {
    /// Creates a required positional parameter.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::Normal,
            optional: false,
        }
    }
}

/// One overload of a function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Parameters in declaration order.
    pub params: Vec<Parameter>,
    /// Return type.
    pub return_type: Type,
}

impl Signature {
    /// Creates a signature.
    pub fn new(params: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            params,
            return_type,
        }
    }
}

/// Whether a function is a plain function/method or a static/class method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    /// A module-level function or an instance method.
    #[default]
    Method,
    /// `@staticmethod`.
    StaticMethod,
    /// `@classmethod`.
    ClassMethod,
}

/// A function or method with one or more overloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Qualified name for module-level functions, bare name for methods.
    pub name: String,
    /// Overloads in declaration order.
    pub signatures: Vec<Arc<Signature>>,
    /// Method flavor.
    pub kind: MethodKind,
}

impl Function {
    /// Creates a function from its signatures.
    pub fn new(name: impl Into<String>, signatures: Vec<Signature>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            signatures: signatures.into_iter().map(Arc::new).collect(),
            kind,
        }
    }
}

/// A module or class level constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    /// Qualified name at module level, bare name inside a class.
    pub name: String,
    /// Declared type.
    pub ty: Type,
}

impl Constant {
    /// Creates a constant.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A module-level alias, `Name = <type>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// Qualified alias name.
    pub name: String,
    /// The aliased type.
    pub ty: Type,
}

impl Alias {
    /// Creates an alias.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A class declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Class {
    /// Qualified class name.
    pub name: String,
    /// Base classes.
    pub parents: Vec<Type>,
    /// Methods, by bare name.
    pub methods: Vec<Arc<Function>>,
    /// Class attributes, by bare name.
    pub constants: Vec<Arc<Constant>>,
    /// Type parameters bound by the class, derived from its bases.
    pub template: Vec<Arc<TypeParameter>>,
}

impl Class {
    /// Creates a class without a template.
    pub fn new(
        name: impl Into<String>,
        parents: Vec<Type>,
        methods: Vec<Function>,
        constants: Vec<Constant>,
    ) -> Self {
        Self {
            name: name.into(),
            parents,
            methods: methods.into_iter().map(Arc::new).collect(),
            constants: constants.into_iter().map(Arc::new).collect(),
            template: Vec::new(),
        }
    }

    /// Finds a method by bare name.
    pub fn method(&self, name: &str) -> Option<&Arc<Function>> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Finds a class attribute by bare name.
    pub fn constant(&self, name: &str) -> Option<&Arc<Constant>> {
        self.constants.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_member_lookup() {
        let class = Class::new(
            "m.A",
            vec![Type::class("builtins.object")],
            vec![Function::new(
                "f",
                vec![Signature::new(vec![], Type::Anything)],
                MethodKind::Method,
            )],
            vec![Constant::new("x", Type::class("builtins.int"))],
        );
        assert!(class.method("f").is_some());
        assert!(class.method("g").is_none());
        assert_eq!(class.constant("x").unwrap().ty, Type::class("builtins.int"));
    }

    #[test]
    fn type_parameter_scope() {
        assert_eq!(TypeParameter::new("T").scope, None);
        assert_eq!(
            TypeParameter::scoped("T", "m.f").scope.as_deref(),
            Some("m.f")
        );
    }

    #[test]
    fn parameter_defaults() {
        let p = Parameter::new("x", Type::Anything);
        assert_eq!(p.kind, ParamKind::Normal);
        assert!(!p.optional);
    }
}
