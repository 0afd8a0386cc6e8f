use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::{ClassType, LateType, NamedType};
use crate::visit::Visitor;

use super::split_name;

/// Collects the module part of every dotted reference in a tree.
///
/// A reference to `pkg.mod.Foo` contributes `pkg.mod`. Undotted names
/// contribute nothing.
#[derive(Debug, Default)]
pub struct CollectDependencies {
    /// Module names seen so far, sorted.
    pub modules: BTreeSet<String>,
}

impl CollectDependencies {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    fn process(&mut self, name: &str) {
        if let Some((module, _)) = split_name(name) {
            if !self.modules.contains(module) {
                self.modules.insert(module.to_string());
            }
        }
    }
}

impl Visitor for CollectDependencies {
    fn visit_named_type(&mut self, node: &Arc<NamedType>) {
        self.process(&node.name);
    }

    fn visit_class_type(&mut self, node: &Arc<ClassType>) {
        self.process(&node.name);
    }

    fn visit_late_type(&mut self, node: &Arc<LateType>) {
        self.process(&node.name);
    }
}
