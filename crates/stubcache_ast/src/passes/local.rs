use std::sync::Arc;

use crate::error::LookupError;
use crate::transform::{self, Transform};
use crate::types::{NamedType, Type};
use crate::unit::{Member, Unit};

/// Resolves undotted names against the module's own declarations.
///
/// A class becomes its fully qualified name, an alias is replaced by its
/// (recursively resolved) target, a type variable becomes a parameter use and
/// functions or constants become `Any`. Unknown names are an error.
pub struct LookupLocalTypes<'a> {
    unit: &'a Unit,
    expanding: Vec<String>,
}

impl<'a> LookupLocalTypes<'a> {
    /// Creates a lookup over the declarations of `unit`.
    pub fn new(unit: &'a Unit) -> Self {
        Self {
            unit,
            expanding: Vec::new(),
        }
    }
}

impl Transform for LookupLocalTypes<'_> {
    type Error = LookupError;

    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, LookupError> {
        if node.name.contains('.') {
            return Ok(Type::Named(node));
        }
        let unit = self.unit;
        match unit.lookup_member(&node.name) {
            Some(Member::Class(cls)) => Ok(Type::named(cls.name.clone())),
            Some(Member::TypeParameter(param)) => Ok(Type::Param(Arc::clone(param))),
            Some(Member::Alias(alias)) => {
                if self.expanding.contains(&alias.name) {
                    return Err(LookupError::UnknownMember {
                        name: alias.name.clone(),
                    });
                }
                self.expanding.push(alias.name.clone());
                let resolved = transform::transform_type(self, &alias.ty);
                self.expanding.pop();
                resolved
            }
            Some(Member::Function(_) | Member::Constant(_)) => Ok(Type::Anything),
            None => Err(LookupError::UnknownMember {
                name: format!("{}.{}", unit.name, node.name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Alias, Class, Constant, TypeParameter};

    fn unit() -> Unit {
        Unit::new("m")
            .with_class(Class::new("m.A", vec![], vec![], vec![]))
            .with_type_param(TypeParameter::new("T"))
            .with_alias(Alias::new(
                "m.AList",
                Type::generic(Type::class("builtins.list"), vec![Type::named("A")]),
            ))
            .with_alias(Alias::new("m.Loop", Type::named("Loop")))
    }

    fn resolve(ty: Type) -> Result<Type, LookupError> {
        let u = unit();
        transform::transform_type(&mut LookupLocalTypes::new(&u), &ty)
    }

    #[test]
    fn class_names_are_qualified() {
        assert_eq!(resolve(Type::named("A")).unwrap(), Type::named("m.A"));
    }

    #[test]
    fn dotted_names_are_untouched() {
        assert_eq!(resolve(Type::named("x.Y")).unwrap(), Type::named("x.Y"));
    }

    #[test]
    fn type_variables_become_parameters() {
        let out = resolve(Type::named("T")).unwrap();
        assert!(matches!(out, Type::Param(ref p) if p.name == "T"));
    }

    #[test]
    fn aliases_are_inlined_and_resolved() {
        let out = resolve(Type::named("AList")).unwrap();
        assert_eq!(out.to_string(), "builtins.list[m.A]");
    }

    #[test]
    fn unknown_names_fail() {
        let err = resolve(Type::named("Nope")).unwrap_err();
        assert_eq!(err.name(), "m.Nope");
    }

    #[test]
    fn alias_cycles_fail() {
        assert!(resolve(Type::named("Loop")).is_err());
    }

    #[test]
    fn constants_resolve_to_anything() {
        let u = Unit::new("m").with_constant(Constant::new("m.x", Type::Anything));
        let out = transform::transform_type(&mut LookupLocalTypes::new(&u), &Type::named("x")).unwrap();
        assert_eq!(out, Type::Anything);
    }
}
