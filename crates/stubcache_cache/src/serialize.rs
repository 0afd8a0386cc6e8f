//! Preparing trees for the cache and restoring them against loaded modules.
//!
//! Storing strips every resolved class pointer and records which modules the
//! tree refers to. Restoring first resolves references into other modules,
//! which may rebuild parts of the tree, and only then links references into
//! the module itself, so those links target the final class nodes.

use std::path::Path;
use std::sync::Arc;

use stubcache_ast::passes::{
    ClearClassPointers, CollectDependencies, FillLocalPointers, FindClassTypes,
    LookupExternalTypes,
};
use stubcache_ast::{LocalModules, ModuleMap, Type, Unit};
use stubcache_common::{InternalError, StubResult};

use crate::bundle::CacheBundle;
use crate::codec;
use crate::error::CacheError;
use crate::rename::RenameModule;

/// Suffix of package initializer modules. They are cached under the package
/// name.
const PACKAGE_INIT_SUFFIX: &str = ".__init__";

/// Builds the bundle that [`store_ast`] persists.
///
/// The returned tree has no resolved class pointers and shares no reference
/// node with `tree`, so resolving the bundle never links the caller's tree.
/// The index lists every class reference node in it.
pub fn prepare_bundle(tree: &Unit) -> StubResult<CacheBundle> {
    let tree = match tree.name.strip_suffix(PACKAGE_INIT_SUFFIX) {
        Some(package) => RenameModule::new(&tree.name, package)?.apply(tree),
        None => tree.clone(),
    };

    let mut deps = CollectDependencies::new();
    tree.visit(&mut deps);
    let mut modules = deps.modules;
    if !tree.is_empty() {
        modules.insert(tree.name.clone());
    }

    let tree = tree.rewrite(&mut ClearClassPointers::detached());
    let mut found = FindClassTypes::new();
    tree.visit(&mut found);

    Ok(CacheBundle::new(
        tree,
        modules.into_iter().collect(),
        Some(found.nodes),
    ))
}

/// Stores `tree` as a cache bundle.
///
/// With a destination the bundle is written there and `None` is returned;
/// without one the encoded bytes are returned.
pub fn store_ast(tree: &Unit, path: Option<&Path>) -> Result<Option<Vec<u8>>, CacheError> {
    let bundle = prepare_bundle(tree)?;
    tracing::debug!(
        module = %bundle.name(),
        dependencies = bundle.dependencies.len(),
        references = bundle.reference_index.as_ref().map_or(0, Vec::len),
        "prepared bundle"
    );
    match path {
        Some(path) => {
            codec::write_bundle(&bundle, path)?;
            Ok(None)
        }
        None => codec::encode_bundle(&bundle).map(Some),
    }
}

/// Renames the bundle's tree to `name` if it was stored under another name.
///
/// Renaming rebuilds the nodes it touches, so the reference index is dropped.
pub fn ensure_ast_name(mut bundle: CacheBundle, name: &str) -> StubResult<CacheBundle> {
    if bundle.tree.name == name {
        return Ok(bundle);
    }
    bundle.invalidate_index();
    bundle.tree = RenameModule::new(&bundle.tree.name, name)?.apply(&bundle.tree);
    Ok(bundle)
}

/// Resolves class references into modules other than `self_name`.
///
/// With an index, each indexed node is resolved on its own; this succeeds as
/// long as every node can be linked in place. As soon as one would have to be
/// replaced, the index is dropped and the whole tree is rebuilt instead. An
/// index that no longer lists the tree's reference nodes is dropped up front.
pub fn lookup_class_references(
    bundle: &mut CacheBundle,
    modules: &ModuleMap,
    self_name: Option<&str>,
) -> Result<(), CacheError> {
    let mut lookup = LookupExternalTypes::new(modules, self_name);
    if bundle.reference_index.is_some() && !bundle.index_is_exact() {
        tracing::warn!(module = %bundle.tree.name, "reference index does not match tree");
        bundle.invalidate_index();
    }
    if let Some(index) = &bundle.reference_index {
        let mut restructured = false;
        for node in index {
            let resolved = lookup.resolve_class_type(node)?;
            if !resolved.is_same(&Type::Class(Arc::clone(node))) {
                tracing::debug!(module = %bundle.tree.name, name = %node.name, "reference changes shape");
                restructured = true;
                break;
            }
        }
        if !restructured {
            tracing::debug!(module = %bundle.tree.name, nodes = index.len(), "resolved through index");
            return Ok(());
        }
        bundle.invalidate_index();
    }
    tracing::debug!(module = %bundle.tree.name, "resolving by full traversal");
    bundle.tree = bundle.tree.transform(&mut lookup)?;
    Ok(())
}

/// Links references into the bundle's own module.
///
/// Only pointers are written; the tree keeps its shape. With an index that
/// matches the tree, every indexed node must end up linked; otherwise the
/// whole tree is walked.
pub fn fill_local_references(bundle: &CacheBundle) -> StubResult<()> {
    let local = LocalModules::new(&bundle.tree);
    let mut fill = FillLocalPointers::new(&local);
    let index = bundle
        .reference_index
        .as_ref()
        .filter(|_| bundle.index_is_exact());
    match index {
        Some(index) => {
            for node in index {
                if !fill.fill(node) {
                    return Err(InternalError::new(format!(
                        "class reference '{}' in '{}' is still unresolved",
                        node.name, bundle.tree.name
                    )));
                }
            }
        }
        None => bundle.tree.visit(&mut fill),
    }
    Ok(())
}

/// Resolves a loaded bundle against `modules` and returns its tree.
///
/// The bundle's own module must not be in `modules` yet; adding the result
/// is up to the caller.
pub fn resolve(mut bundle: CacheBundle, modules: &ModuleMap) -> Result<Unit, CacheError> {
    let name = bundle.tree.name.clone();
    if modules.contains_key(&name) {
        return Err(InternalError::new(format!("module '{name}' is already loaded")).into());
    }
    lookup_class_references(&mut bundle, modules, Some(&name))?;
    fill_local_references(&bundle)?;
    tracing::debug!(module = %name, "resolved");
    Ok(bundle.tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_ast::{Alias, Class, Constant};

    fn other() -> ModuleMap {
        let other = Unit::new("other")
            .with_class(Class::new("other.B", vec![], vec![], vec![]))
            .with_alias(Alias::new("other.Al", Type::class("other.B")));
        let mut map = ModuleMap::new();
        map.insert("other".to_string(), Arc::new(other));
        map
    }

    fn tree() -> Unit {
        Unit::new("m")
            .with_class(Class::new("m.A", vec![Type::class("other.B")], vec![], vec![]))
            .with_constant(Constant::new("m.x", Type::class("m.A")))
    }

    #[test]
    fn bundle_lists_dependencies_and_references() {
        let bundle = prepare_bundle(&tree()).unwrap();
        assert_eq!(bundle.dependencies, ["m", "other"]);
        assert_eq!(bundle.reference_index.as_ref().unwrap().len(), 2);
        assert!(bundle.index_is_exact());
    }

    #[test]
    fn empty_tree_has_no_dependencies() {
        let bundle = prepare_bundle(&Unit::new("m")).unwrap();
        assert!(bundle.dependencies.is_empty());
    }

    #[test]
    fn package_init_is_stored_under_package_name() {
        let tree = Unit::new("pkg.__init__")
            .with_constant(Constant::new("pkg.__init__.x", Type::class("pkg.__init__.A")));
        let bundle = prepare_bundle(&tree).unwrap();
        assert_eq!(bundle.name(), "pkg");
        assert_eq!(bundle.tree.constants[0].name, "pkg.x");
        assert_eq!(bundle.dependencies, ["pkg"]);
    }

    #[test]
    fn stored_trees_carry_no_pointers() {
        let map = other();
        let linked = tree()
            .transform(&mut LookupExternalTypes::new(&map, Some("m")))
            .unwrap();
        let bundle = prepare_bundle(&linked).unwrap();
        let index = bundle.reference_index.unwrap();
        assert!(index.iter().all(|node| !node.is_resolved()));
    }

    #[test]
    fn store_without_path_returns_bytes() {
        let bytes = store_ast(&tree(), None).unwrap().unwrap();
        let bundle = codec::decode_bundle(&bytes).unwrap();
        assert_eq!(bundle.tree, tree());
    }

    #[test]
    fn ensure_name_renames_and_drops_index() {
        let bundle = prepare_bundle(&tree()).unwrap();
        let same = ensure_ast_name(bundle, "m").unwrap();
        assert!(same.reference_index.is_some());
        let moved = ensure_ast_name(same, "n").unwrap();
        assert_eq!(moved.name(), "n");
        assert!(moved.reference_index.is_none());
        assert_eq!(moved.tree.constants[0].ty, Type::class("n.A"));
    }

    #[test]
    fn index_survives_in_place_linking() {
        let map = other();
        let mut bundle = prepare_bundle(&tree()).unwrap();
        let before = bundle.tree.classes[0].clone();
        lookup_class_references(&mut bundle, &map, Some("m")).unwrap();
        assert!(bundle.reference_index.is_some());
        assert!(Arc::ptr_eq(&bundle.tree.classes[0], &before));
    }

    #[test]
    fn alias_reference_forces_full_traversal() {
        let map = other();
        let tree = Unit::new("m").with_constant(Constant::new("m.x", Type::class("other.Al")));
        let mut bundle = prepare_bundle(&tree).unwrap();
        lookup_class_references(&mut bundle, &map, Some("m")).unwrap();
        assert!(bundle.reference_index.is_none());
        match &bundle.tree.constants[0].ty {
            Type::Class(c) => {
                assert_eq!(c.name, "other.B");
                assert!(c.points_to(&map["other"].classes[0]));
            }
            other => panic!("expected class type, got {other:?}"),
        }
    }

    #[test]
    fn stale_index_falls_back_to_full_traversal() {
        let map = other();
        let mut bundle = prepare_bundle(&tree()).unwrap();
        bundle.tree = Unit::new("m")
            .with_constant(Constant::new("m.y", Type::class("other.B")))
            .with_constant(Constant::new("m.z", Type::class("other.B")));
        lookup_class_references(&mut bundle, &map, Some("m")).unwrap();
        assert!(bundle.reference_index.is_none());

        let mut found = FindClassTypes::new();
        bundle.tree.visit(&mut found);
        assert_eq!(found.nodes.len(), 2);
        assert!(found.nodes.iter().all(|node| node.is_resolved()));
    }

    #[test]
    fn stale_index_is_not_trusted_by_fill() {
        let mut bundle = prepare_bundle(&tree()).unwrap();
        bundle.tree = Unit::new("m")
            .with_class(Class::new("m.C", vec![], vec![], vec![]))
            .with_constant(Constant::new("m.c", Type::class("m.C")));
        fill_local_references(&bundle).unwrap();
        match &bundle.tree.constants[0].ty {
            Type::Class(c) => assert!(c.points_to(&bundle.tree.classes[0])),
            other => panic!("expected class type, got {other:?}"),
        }
    }

    #[test]
    fn storing_leaves_the_input_unlinked() {
        let map = other();
        let input = tree();
        let bundle = prepare_bundle(&input).unwrap();
        resolve(bundle, &map).unwrap();

        let mut found = FindClassTypes::new();
        input.visit(&mut found);
        assert!(!found.nodes.is_empty());
        assert!(found.nodes.iter().all(|node| !node.is_resolved()));
    }

    #[test]
    fn indexed_fill_requires_every_link() {
        let tree = Unit::new("m").with_constant(Constant::new("m.x", Type::class("m.Gone")));
        let bundle = prepare_bundle(&tree).unwrap();
        let err = fill_local_references(&bundle).unwrap_err();
        assert!(err.to_string().contains("m.Gone"));
    }

    #[test]
    fn full_fill_leaves_unknown_names() {
        let tree = Unit::new("m").with_constant(Constant::new("m.x", Type::class("m.Gone")));
        let mut bundle = prepare_bundle(&tree).unwrap();
        bundle.invalidate_index();
        fill_local_references(&bundle).unwrap();
    }

    #[test]
    fn resolve_rejects_loaded_module() {
        let mut map = other();
        map.insert("m".to_string(), Arc::new(Unit::new("m")));
        let bundle = prepare_bundle(&tree()).unwrap();
        assert!(matches!(
            resolve(bundle, &map),
            Err(CacheError::Internal(_))
        ));
    }
}
