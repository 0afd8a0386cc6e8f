//! Turning stub source into declaration trees ready to be stored.

use std::sync::Arc;

use stubcache_ast::passes::{
    AdjustTypeParameters, CanonicalOrdering, ExpandCompatibleBuiltins, FillLocalPointers,
    LookupBuiltins, LookupLocalTypes, NamedTypeToClassType,
};
use stubcache_ast::{LocalModules, ModuleMap, Unit};
use stubcache_common::PythonVersion;
use stubcache_parser::ParseError;

use crate::error::CacheError;

const BUILTINS_STUB: &str = include_str!("../stubs/builtins.pyi");
const TYPING_STUB: &str = include_str!("../stubs/typing.pyi");

/// Source access used when trees are built from stub text.
pub trait Loader {
    /// The builtin declaration table unqualified names resolve against.
    fn builtins(&self) -> &Unit;

    /// Renders a tree as stub source.
    fn print(&self, unit: &Unit) -> String;

    /// Parses stub source for `module`.
    fn parse(&self, source: &str, module: &str, version: PythonVersion) -> Result<Unit, ParseError>;
}

/// A [`Loader`] backed by the stub parser, with the `builtins` and `typing`
/// tables loaded up front.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    builtins: Arc<Unit>,
    typing: Arc<Unit>,
}

impl SourceLoader {
    /// Loads the bundled builtin and typing tables for `version`.
    pub fn new(version: PythonVersion) -> Result<Self, CacheError> {
        Self::from_builtins_source(BUILTINS_STUB, version)
    }

    /// Loads a custom builtin table alongside the bundled typing table.
    pub fn from_builtins_source(source: &str, version: PythonVersion) -> Result<Self, CacheError> {
        let builtins = stubcache_parser::parse_source(source, "builtins", version)?;
        let builtins = Arc::new(finish_local(resolve_local_names(builtins)?));

        let typing = stubcache_parser::parse_source(TYPING_STUB, "typing", version)?;
        let typing = resolve_builtin_names(typing, &builtins);
        let typing = Arc::new(finish_local(resolve_local_names(typing)?));

        let loader = Self { builtins, typing };
        // builtin generics derive from typing classes
        let prelude = loader.prelude();
        loader.builtins.visit(&mut FillLocalPointers::new(&prelude));
        tracing::debug!(
            builtins = loader.builtins.classes.len(),
            typing = loader.typing.classes.len(),
            "loaded builtin tables"
        );
        Ok(loader)
    }

    /// The resolved `typing` table.
    pub fn typing(&self) -> &Unit {
        &self.typing
    }

    /// A module map holding the builtin and typing tables, to seed loading.
    pub fn prelude(&self) -> ModuleMap {
        let mut modules = ModuleMap::new();
        modules.insert(self.builtins.name.clone(), Arc::clone(&self.builtins));
        modules.insert(self.typing.name.clone(), Arc::clone(&self.typing));
        modules
    }
}

impl Loader for SourceLoader {
    fn builtins(&self) -> &Unit {
        &self.builtins
    }

    fn print(&self, unit: &Unit) -> String {
        stubcache_parser::print_unit(unit)
    }

    fn parse(&self, source: &str, module: &str, version: PythonVersion) -> Result<Unit, ParseError> {
        stubcache_parser::parse_source(source, module, version)
    }
}

/// Resolves unqualified builtin names and widens builtin parameter types.
pub(crate) fn resolve_builtin_names(unit: Unit, builtins: &Unit) -> Unit {
    let unit = unit.rewrite(&mut LookupBuiltins::new(builtins));
    unit.rewrite(&mut ExpandCompatibleBuiltins::new(builtins))
}

/// Qualifies the module's own names, scopes type parameters and turns the
/// remaining names into class references.
pub(crate) fn resolve_local_names(unit: Unit) -> Result<Unit, CacheError> {
    let unit = unit.transform(&mut LookupLocalTypes::new(&unit))?;
    let unit = unit.rewrite(&mut AdjustTypeParameters::new());
    Ok(unit.rewrite(&mut NamedTypeToClassType))
}

/// Orders the declarations, then links references into the module itself.
fn finish_local(unit: Unit) -> Unit {
    let unit = unit.rewrite(&mut CanonicalOrdering);
    unit.visit(&mut FillLocalPointers::new(&LocalModules::new(&unit)));
    unit
}

/// Builds the tree of `module` from its stub source.
///
/// References into other modules are left unresolved; the result is meant to
/// be stored with [`store_ast`](crate::store_ast).
pub fn load_source<L: Loader + ?Sized>(
    module: &str,
    version: PythonVersion,
    source: &str,
    loader: &L,
) -> Result<Unit, CacheError> {
    let unit = loader.parse(source, module, version)?;
    let unit = resolve_builtin_names(unit, loader.builtins());
    let unit = finish_local(resolve_local_names(unit)?);
    tracing::debug!(module, classes = unit.classes.len(), "loaded source");
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_ast::passes::FindClassTypes;
    use stubcache_ast::Type;

    fn loader() -> SourceLoader {
        SourceLoader::new(PythonVersion::default()).unwrap()
    }

    #[test]
    fn bundled_tables_are_linked() {
        let loader = loader();
        let mut found = FindClassTypes::new();
        loader.builtins().visit(&mut found);
        assert!(!found.nodes.is_empty());
        assert!(found.nodes.iter().all(|node| node.is_resolved()));

        let mut found = FindClassTypes::new();
        loader.typing().visit(&mut found);
        assert!(found.nodes.iter().all(|node| node.is_resolved()));
        assert!(loader.prelude().contains_key("typing"));
    }

    #[test]
    fn source_names_are_resolved() {
        let loader = loader();
        let src = "\
class A:
    parent: A
    def f(self, x: float) -> other.B: ...
";
        let unit = load_source("m", PythonVersion::default(), src, &loader).unwrap();
        let class = &unit.classes[0];
        match &class.constants[0].ty {
            Type::Class(c) => assert!(c.points_to(class)),
            other => panic!("expected class type, got {other:?}"),
        }
        let sig = &class.methods[0].signatures[0];
        assert_eq!(sig.params[1].ty.to_string(), "builtins.float | builtins.int");
        match &sig.return_type {
            Type::Class(c) => {
                assert_eq!(c.name, "other.B");
                assert!(!c.is_resolved());
            }
            other => panic!("expected class type, got {other:?}"),
        }
    }

    #[test]
    fn unknown_local_name_is_reported() {
        let err = load_source("m", PythonVersion::default(), "x: Nope\n", &loader()).unwrap_err();
        assert!(matches!(err, CacheError::UnresolvedDependency { name } if name == "m.Nope"));
    }

    #[test]
    fn parse_errors_propagate() {
        let err = load_source("m", PythonVersion::default(), "class A(\n", &loader()).unwrap_err();
        assert!(matches!(err, CacheError::Parse(_)));
    }

    #[test]
    fn custom_builtins_replace_the_bundled_table() {
        let src = "class object: ...\nclass str(object): ...\nclass int(object): ...\n";
        let loader = SourceLoader::from_builtins_source(src, PythonVersion::default()).unwrap();
        assert_eq!(loader.builtins().classes.len(), 3);
    }
}
