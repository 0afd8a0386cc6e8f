use std::convert::Infallible;
use std::sync::Arc;

use crate::transform::Transform;
use crate::types::{ClassType, Type};
use crate::unit::{Member, ModuleLookup};
use crate::visit::Visitor;

use super::split_name;

/// Replaces every resolved class reference by an unresolved copy.
///
/// The input tree is left untouched; nodes that were never resolved are
/// shared with the output. [`ClearClassPointers::within`] restricts the pass
/// to the direct members of one module; [`ClearClassPointers::detached`]
/// replaces unresolved nodes too.
#[derive(Debug, Default)]
pub struct ClearClassPointers {
    prefix: Option<String>,
    detach: bool,
}

impl ClearClassPointers {
    /// Clears every resolved reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears only references to direct members of `module`.
    pub fn within(module: &str) -> Self {
        Self {
            prefix: Some(format!("{module}.")),
            detach: false,
        }
    }

    /// Replaces every reference by a fresh unresolved node, so no pointer
    /// slot of the output is reachable from the input.
    pub fn detached() -> Self {
        Self {
            prefix: None,
            detach: true,
        }
    }

    fn applies_to(&self, name: &str) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => name
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.contains('.')),
        }
    }
}

impl Transform for ClearClassPointers {
    type Error = Infallible;

    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, Infallible> {
        if (self.detach || node.is_resolved()) && self.applies_to(&node.name) {
            Ok(Type::class(node.name.clone()))
        } else {
            Ok(Type::Class(node))
        }
    }
}

/// Collects every reachable class reference node, in traversal order.
///
/// A node shared by several parents is collected once per occurrence.
#[derive(Debug, Default)]
pub struct FindClassTypes {
    /// Collected nodes.
    pub nodes: Vec<Arc<ClassType>>,
}

impl FindClassTypes {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for FindClassTypes {
    fn visit_class_type(&mut self, node: &Arc<ClassType>) {
        self.nodes.push(Arc::clone(node));
    }
}

/// Links unresolved class references to classes found in `modules`.
///
/// Undotted names are looked up in the module registered under `""`.
/// References that cannot be linked are left alone.
pub struct FillLocalPointers<'a, M: ModuleLookup + ?Sized> {
    modules: &'a M,
}

impl<'a, M: ModuleLookup + ?Sized> FillLocalPointers<'a, M> {
    /// Creates a filler over `modules`.
    pub fn new(modules: &'a M) -> Self {
        Self { modules }
    }

    /// Fills a single node, returning whether it ends up resolved.
    pub fn fill(&self, node: &ClassType) -> bool {
        if node.is_resolved() {
            return true;
        }
        let (module_name, member) = split_name(&node.name).unwrap_or(("", node.name.as_str()));
        let Some(module) = self.modules.module(module_name) else {
            return false;
        };
        match module.lookup_member(member) {
            Some(Member::Class(cls)) => {
                node.set_cls(cls);
                true
            }
            _ => false,
        }
    }
}

impl<M: ModuleLookup + ?Sized> Visitor for FillLocalPointers<'_, M> {
    fn visit_class_type(&mut self, node: &Arc<ClassType>) {
        self.fill(node);
    }
}
