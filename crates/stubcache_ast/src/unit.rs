//! The root of a declaration tree and the module map used for resolution.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decl::{Alias, Class, Constant, Function, TypeParameter};
use crate::transform::{self, Transform};
use crate::visit::{self, Visitor};

/// Resolved modules keyed by module name.
///
/// The empty string may be used as a key for "the module currently being
/// resolved".
pub type ModuleMap = HashMap<String, Arc<Unit>>;

/// The declarations of one module.
///
/// Top-level names are fully qualified with the module name
/// (`mod.Class`), except type-parameter declarations which keep their bare
/// name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Dotted module name.
    pub name: String,
    /// Module-level constants.
    pub constants: Vec<Arc<Constant>>,
    /// Module-level type variables.
    pub type_params: Vec<Arc<TypeParameter>>,
    /// Classes.
    pub classes: Vec<Arc<Class>>,
    /// Functions.
    pub functions: Vec<Arc<Function>>,
    /// Aliases.
    pub aliases: Vec<Arc<Alias>>,
}

/// A top-level declaration found by [`Unit::lookup`].
#[derive(Clone, Copy, Debug)]
pub enum Member<'a> {
    /// A class.
    Class(&'a Arc<Class>),
    /// A function.
    Function(&'a Arc<Function>),
    /// A constant.
    Constant(&'a Arc<Constant>),
    /// An alias.
    Alias(&'a Arc<Alias>),
    /// A type variable.
    TypeParameter(&'a Arc<TypeParameter>),
}

impl Unit {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a class.
    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.push(Arc::new(class));
        self
    }

    /// Adds a function.
    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.push(Arc::new(function));
        self
    }

    /// Adds a constant.
    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constants.push(Arc::new(constant));
        self
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: Alias) -> Self {
        self.aliases.push(Arc::new(alias));
        self
    }

    /// Adds a type variable declaration.
    pub fn with_type_param(mut self, param: TypeParameter) -> Self {
        self.type_params.push(Arc::new(param));
        self
    }

    /// Returns `true` if the module declares nothing.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
            && self.type_params.is_empty()
            && self.classes.is_empty()
            && self.functions.is_empty()
            && self.aliases.is_empty()
    }

    /// Finds a top-level declaration by its fully qualified name.
    pub fn lookup(&self, name: &str) -> Option<Member<'_>> {
        if let Some(c) = self.classes.iter().find(|c| c.name == name) {
            return Some(Member::Class(c));
        }
        if let Some(f) = self.functions.iter().find(|f| f.name == name) {
            return Some(Member::Function(f));
        }
        if let Some(c) = self.constants.iter().find(|c| c.name == name) {
            return Some(Member::Constant(c));
        }
        if let Some(a) = self.aliases.iter().find(|a| a.name == name) {
            return Some(Member::Alias(a));
        }
        let bare = self.strip_prefix(name).unwrap_or(name);
        self.type_params
            .iter()
            .find(|p| p.name == bare)
            .map(Member::TypeParameter)
    }

    /// Finds a top-level declaration by its name relative to this module.
    pub fn lookup_member(&self, short: &str) -> Option<Member<'_>> {
        self.lookup(&format!("{}.{short}", self.name))
            .or_else(|| self.lookup(short))
    }

    /// Finds a class by its fully qualified name.
    pub fn lookup_class(&self, name: &str) -> Option<&Arc<Class>> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Strips `"<self.name>."` from `name`, if present.
    pub fn strip_prefix<'n>(&self, name: &'n str) -> Option<&'n str> {
        name.strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
    }

    /// Runs a fallible transform over the tree.
    pub fn transform<T: Transform>(&self, t: &mut T) -> Result<Unit, T::Error> {
        transform::transform_unit(t, self)
    }

    /// Runs an infallible transform over the tree.
    pub fn rewrite<T: Transform<Error = Infallible>>(&self, t: &mut T) -> Unit {
        match transform::transform_unit(t, self) {
            Ok(unit) => unit,
            Err(never) => match never {},
        }
    }

    /// Walks the tree with a read-only visitor.
    pub fn visit<V: Visitor>(&self, v: &mut V) {
        visit::walk_unit(v, self);
    }
}

/// Source of loaded modules for name resolution.
pub trait ModuleLookup {
    /// Returns the module registered under `name`.
    fn module(&self, name: &str) -> Option<&Unit>;
}

impl ModuleLookup for ModuleMap {
    fn module(&self, name: &str) -> Option<&Unit> {
        self.get(name).map(Arc::as_ref)
    }
}

/// A lookup that only knows one module, under its own name and under `""`.
#[derive(Clone, Copy, Debug)]
pub struct LocalModules<'a> {
    unit: &'a Unit,
}

impl<'a> LocalModules<'a> {
    /// Creates a lookup answering for `unit` alone.
    pub fn new(unit: &'a Unit) -> Self {
        Self { unit }
    }
}

impl ModuleLookup for LocalModules<'_> {
    fn module(&self, name: &str) -> Option<&Unit> {
        (name.is_empty() || name == self.unit.name).then_some(self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn sample() -> Unit {
        Unit::new("m")
            .with_class(Class::new("m.A", vec![], vec![], vec![]))
            .with_constant(Constant::new("m.x", Type::class("m.A")))
            .with_alias(Alias::new("m.B", Type::class("m.A")))
            .with_type_param(TypeParameter::new("T"))
    }

    #[test]
    fn lookup_by_full_name() {
        let unit = sample();
        assert!(matches!(unit.lookup("m.A"), Some(Member::Class(_))));
        assert!(matches!(unit.lookup("m.x"), Some(Member::Constant(_))));
        assert!(matches!(unit.lookup("m.B"), Some(Member::Alias(_))));
        assert!(matches!(unit.lookup("m.T"), Some(Member::TypeParameter(_))));
        assert!(unit.lookup("m.Missing").is_none());
    }

    #[test]
    fn lookup_member_relative() {
        let unit = sample();
        assert!(matches!(unit.lookup_member("A"), Some(Member::Class(_))));
        assert!(matches!(
            unit.lookup_member("T"),
            Some(Member::TypeParameter(_))
        ));
    }

    #[test]
    fn empty_unit() {
        assert!(Unit::new("m").is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn strip_prefix_requires_separator() {
        let unit = Unit::new("pkg.m");
        assert_eq!(unit.strip_prefix("pkg.m.A"), Some("A"));
        assert_eq!(unit.strip_prefix("pkg.mod.A"), None);
    }

    #[test]
    fn local_modules_answer_self_and_empty() {
        let unit = sample();
        let local = LocalModules::new(&unit);
        assert!(local.module("").is_some());
        assert!(local.module("m").is_some());
        assert!(local.module("other").is_none());
    }

    #[test]
    fn module_map_lookup() {
        let mut map = ModuleMap::new();
        map.insert("m".to_string(), Arc::new(sample()));
        assert_eq!(map.module("m").unwrap().name, "m");
        assert!(map.module("n").is_none());
    }
}
