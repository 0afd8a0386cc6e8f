//! The unit of persistence: a tree, its dependencies and an optional index
//! of its class references.

use std::sync::Arc;

use stubcache_ast::passes::FindClassTypes;
use stubcache_ast::{ClassType, Unit};

/// A declaration tree packaged for storage.
///
/// `reference_index`, when present, lists every class reference node
/// reachable from `tree`, one entry per occurrence. It lets resolution visit
/// just those nodes instead of walking the whole tree. Any step that may
/// replace one of them must drop the index.
#[derive(Debug, Clone)]
pub struct CacheBundle {
    /// The module's declarations.
    pub tree: Unit,
    /// Sorted, deduplicated names of the modules `tree` refers to.
    pub dependencies: Vec<String>,
    /// Handles to the class reference nodes of `tree`, if known.
    pub reference_index: Option<Vec<Arc<ClassType>>>,
}

impl CacheBundle {
    /// Creates a bundle.
    pub fn new(
        tree: Unit,
        dependencies: Vec<String>,
        reference_index: Option<Vec<Arc<ClassType>>>,
    ) -> Self {
        Self {
            tree,
            dependencies,
            reference_index,
        }
    }

    /// Returns the module name of the tree.
    pub fn name(&self) -> &str {
        &self.tree.name
    }

    /// Drops the reference index, forcing a full traversal on next use.
    pub fn invalidate_index(&mut self) {
        if self.reference_index.take().is_some() {
            tracing::debug!(module = %self.tree.name, "reference index invalidated");
        }
    }

    /// Returns `true` if the index lists exactly the reference nodes
    /// reachable from the tree, occurrence for occurrence.
    pub fn index_is_exact(&self) -> bool {
        let Some(index) = &self.reference_index else {
            return false;
        };
        let mut found = FindClassTypes::new();
        self.tree.visit(&mut found);
        let mut reachable: Vec<*const ClassType> = found.nodes.iter().map(Arc::as_ptr).collect();
        let mut indexed: Vec<*const ClassType> = index.iter().map(Arc::as_ptr).collect();
        reachable.sort();
        indexed.sort();
        reachable == indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_ast::{Constant, Type};

    fn indexed_bundle() -> CacheBundle {
        let tree = Unit::new("m").with_constant(Constant::new("m.x", Type::class("other.A")));
        let mut found = FindClassTypes::new();
        tree.visit(&mut found);
        CacheBundle::new(tree, vec!["other".to_string()], Some(found.nodes))
    }

    #[test]
    fn fresh_index_is_exact() {
        let bundle = indexed_bundle();
        assert_eq!(bundle.name(), "m");
        assert!(bundle.index_is_exact());
    }

    #[test]
    fn foreign_nodes_make_the_index_inexact() {
        let mut bundle = indexed_bundle();
        bundle.reference_index = Some(vec![Arc::new(ClassType::new("other.A"))]);
        assert!(!bundle.index_is_exact());
    }

    #[test]
    fn invalidate_drops_index() {
        let mut bundle = indexed_bundle();
        bundle.invalidate_index();
        assert!(bundle.reference_index.is_none());
        assert!(!bundle.index_is_exact());
    }
}
