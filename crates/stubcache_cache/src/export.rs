//! Normalizing a tree for re-export as stub source.

use stubcache_ast::passes::{
    CanonicalOrdering, ClassTypeToLateType, ClearClassPointers, FillLocalPointers,
};
use stubcache_ast::{LocalModules, Unit};
use stubcache_common::PythonVersion;

use crate::error::CacheError;
use crate::loader::{resolve_builtin_names, resolve_local_names, Loader};

/// Namespaces whose class references stay resolved in exported trees, in
/// addition to the module itself.
pub const DEFAULT_PROTECTED_NAMESPACES: &[&str] = &["builtins", "typing"];

/// Produces the tree a fresh load of `tree`'s printed source would yield.
///
/// References into other modules are not resolved: they become lazy
/// references, except for those into `module` itself and the
/// [`DEFAULT_PROTECTED_NAMESPACES`].
pub fn prepare_for_export<L: Loader + ?Sized>(
    module: &str,
    version: PythonVersion,
    tree: &Unit,
    loader: &L,
) -> Result<Unit, CacheError> {
    prepare_for_export_with(module, version, tree, loader, DEFAULT_PROTECTED_NAMESPACES)
}

/// Like [`prepare_for_export`], with an explicit list of protected
/// namespaces.
pub fn prepare_for_export_with<L, S>(
    module: &str,
    version: PythonVersion,
    tree: &Unit,
    loader: &L,
    protected: &[S],
) -> Result<Unit, CacheError>
where
    L: Loader + ?Sized,
    S: AsRef<str>,
{
    let source = loader.print(tree);
    let unit = loader.parse(&source, module, version)?;
    let unit = resolve_builtin_names(unit, loader.builtins());
    let unit = resolve_local_names(unit)?;
    unit.visit(&mut FillLocalPointers::new(&LocalModules::new(&unit)));
    let unit = unit.rewrite(&mut CanonicalOrdering);

    let prefixes = std::iter::once(format!("{module}."))
        .chain(protected.iter().map(|ns| format!("{}.", ns.as_ref())));
    let unit = unit.rewrite(&mut ClassTypeToLateType::new(prefixes));

    // reordering may have rebuilt classes that local references point at
    let unit = unit.rewrite(&mut ClearClassPointers::within(module));
    unit.visit(&mut FillLocalPointers::new(&LocalModules::new(&unit)));

    tracing::debug!(module, "prepared for export");
    Ok(unit)
}
