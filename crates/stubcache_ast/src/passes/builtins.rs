use std::convert::Infallible;
use std::sync::Arc;

use crate::decl::Parameter;
use crate::transform::{self, Transform};
use crate::types::{ClassType, NamedType, Type, UnionType};
use crate::unit::{Member, Unit};

/// Resolves names against the builtin declaration table.
///
/// Undotted names and names qualified with the builtin module's own name are
/// looked up; a class becomes a linked [`ClassType`], an alias is replaced by
/// what it aliases. Anything else is left for later passes.
pub struct LookupBuiltins<'a> {
    builtins: &'a Unit,
}

impl<'a> LookupBuiltins<'a> {
    /// Creates a lookup over `builtins`.
    pub fn new(builtins: &'a Unit) -> Self {
        Self { builtins }
    }
}

impl Transform for LookupBuiltins<'_> {
    type Error = Infallible;

    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, Infallible> {
        let short = if node.name.contains('.') {
            self.builtins.strip_prefix(&node.name)
        } else {
            Some(node.name.as_str())
        };
        match short.and_then(|s| self.builtins.lookup_member(s)) {
            Some(Member::Class(cls)) => Ok(Type::Class(Arc::new(ClassType::resolved(
                cls.name.clone(),
                cls,
            )))),
            Some(Member::Alias(alias)) => Ok(alias.ty.clone()),
            _ => Ok(Type::Named(node)),
        }
    }
}

/// Builtin classes accepted where another builtin is declared.
const COMPATIBLE_BUILTINS: &[(&str, &[&str])] = &[
    ("float", &["int"]),
    ("complex", &["float", "int"]),
    ("bytes", &["bytearray", "memoryview"]),
];

/// Widens parameter types to the builtins implicitly accepted in their place.
///
/// A parameter declared `float` also accepts `int`, so its type becomes
/// `float | int`. Only compatible classes present in the builtin table are
/// added. Return types and attributes are not widened.
pub struct ExpandCompatibleBuiltins {
    replacements: Vec<(String, Type)>,
}

impl ExpandCompatibleBuiltins {
    /// Precomputes the replacements available in `builtins`.
    pub fn new(builtins: &Unit) -> Self {
        let class_type = |short: &str| {
            builtins
                .lookup_class(&format!("{}.{short}", builtins.name))
                .map(|cls| Type::Class(Arc::new(ClassType::resolved(cls.name.clone(), cls))))
        };
        let mut replacements = Vec::new();
        for &(declared, accepted) in COMPATIBLE_BUILTINS {
            let Some(base) = class_type(declared) else {
                continue;
            };
            let extra: Vec<Type> = accepted
                .iter()
                .copied()
                .filter_map(|a| class_type(a))
                .collect();
            if extra.is_empty() {
                continue;
            }
            let name = base.name().unwrap_or_default().to_string();
            replacements.push((name, Type::union(std::iter::once(base).chain(extra))));
        }
        Self { replacements }
    }
}

struct Widen<'a> {
    replacements: &'a [(String, Type)],
}

impl Transform for Widen<'_> {
    type Error = Infallible;

    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, Infallible> {
        Ok(self
            .replacements
            .iter()
            .find(|(name, _)| *name == node.name)
            .map(|(_, union)| union.clone())
            .unwrap_or(Type::Class(node)))
    }

    fn transform_union_type(&mut self, node: Arc<UnionType>) -> Result<Type, Infallible> {
        let nested = node.types.iter().any(|t| matches!(t, Type::Union(_)));
        if nested {
            Ok(Type::union(node.types.iter().cloned()))
        } else {
            Ok(Type::Union(node))
        }
    }
}

impl Transform for ExpandCompatibleBuiltins {
    type Error = Infallible;

    fn transform_parameter(&mut self, param: Parameter) -> Result<Parameter, Infallible> {
        let mut widen = Widen {
            replacements: &self.replacements,
        };
        let ty = transform::transform_type(&mut widen, &param.ty)?;
        Ok(Parameter { ty, ..param })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Alias, Class, Constant, Function, MethodKind, Signature};

    fn builtins() -> Unit {
        Unit::new("builtins")
            .with_class(Class::new("builtins.int", vec![], vec![], vec![]))
            .with_class(Class::new("builtins.float", vec![], vec![], vec![]))
            .with_class(Class::new("builtins.str", vec![], vec![], vec![]))
            .with_alias(Alias::new("builtins.Text", Type::class("builtins.str")))
    }

    #[test]
    fn bare_and_qualified_names_resolve() {
        let b = builtins();
        let unit = Unit::new("m")
            .with_constant(Constant::new("m.a", Type::named("int")))
            .with_constant(Constant::new("m.b", Type::named("builtins.str")))
            .with_constant(Constant::new("m.c", Type::named("Text")))
            .with_constant(Constant::new("m.d", Type::named("Local")));
        let out = unit.rewrite(&mut LookupBuiltins::new(&b));
        match &out.constants[0].ty {
            Type::Class(c) => {
                assert_eq!(c.name, "builtins.int");
                assert!(c.points_to(&b.classes[0]));
            }
            other => panic!("expected class type, got {other:?}"),
        }
        assert_eq!(out.constants[1].ty, Type::class("builtins.str"));
        assert_eq!(out.constants[2].ty, Type::class("builtins.str"));
        assert_eq!(out.constants[3].ty, Type::named("Local"));
    }

    #[test]
    fn float_parameters_accept_int() {
        let b = builtins();
        let float = Type::class("builtins.float");
        let unit = Unit::new("m").with_function(Function::new(
            "m.f",
            vec![Signature::new(
                vec![Parameter::new("x", float.clone())],
                float.clone(),
            )],
            MethodKind::Method,
        ));
        let out = unit.rewrite(&mut ExpandCompatibleBuiltins::new(&b));
        let sig = &out.functions[0].signatures[0];
        assert_eq!(sig.params[0].ty.to_string(), "builtins.float | builtins.int");
        assert_eq!(sig.return_type, float);
    }

    #[test]
    fn expansion_is_stable_on_already_widened_unions() {
        let b = builtins();
        let widened = Type::union([Type::class("builtins.float"), Type::class("builtins.int")]);
        let unit = Unit::new("m").with_function(Function::new(
            "m.f",
            vec![Signature::new(
                vec![Parameter::new("x", widened.clone())],
                Type::Anything,
            )],
            MethodKind::Method,
        ));
        let out = unit.rewrite(&mut ExpandCompatibleBuiltins::new(&b));
        assert_eq!(out.functions[0].signatures[0].params[0].ty, widened);
    }

    #[test]
    fn missing_compatible_classes_are_skipped() {
        let b = Unit::new("builtins")
            .with_class(Class::new("builtins.complex", vec![], vec![], vec![]));
        let expand = ExpandCompatibleBuiltins::new(&b);
        assert!(expand.replacements.is_empty());
    }
}
