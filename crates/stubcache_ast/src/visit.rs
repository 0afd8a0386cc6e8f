//! Read-only, pre-order traversal of declaration trees.
//!
//! Implement [`Visitor`] and override the hooks of interest. Each hook has a
//! default implementation that calls the corresponding `walk_*` function, so
//! an override that still wants to descend should call it explicitly.

use std::sync::Arc;

use crate::decl::{Alias, Class, Constant, Function, TypeParameter};
use crate::types::{ClassType, LateType, NamedType, Type};
use crate::unit::Unit;

/// Read-only tree visitor.
pub trait Visitor {
    /// Visits the root.
    fn visit_unit(&mut self, unit: &Unit) {
        walk_unit(self, unit);
    }

    /// Visits a class.
    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }

    /// Visits a function or method.
    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    /// Visits a constant.
    fn visit_constant(&mut self, constant: &Constant) {
        self.visit_type(&constant.ty);
    }

    /// Visits an alias.
    fn visit_alias(&mut self, alias: &Alias) {
        self.visit_type(&alias.ty);
    }

    /// Visits a type parameter declaration or use.
    fn visit_type_parameter(&mut self, _param: &Arc<TypeParameter>) {}

    /// Visits a type expression.
    fn visit_type(&mut self, ty: &Type) {
        walk_type(self, ty);
    }

    /// Visits an unclassified name.
    fn visit_named_type(&mut self, _node: &Arc<NamedType>) {}

    /// Visits a class reference.
    fn visit_class_type(&mut self, _node: &Arc<ClassType>) {}

    /// Visits a lazy reference.
    fn visit_late_type(&mut self, _node: &Arc<LateType>) {}
}

/// Walks every declaration of the unit.
pub fn walk_unit<V: Visitor + ?Sized>(v: &mut V, unit: &Unit) {
    for constant in &unit.constants {
        v.visit_constant(constant);
    }
    for param in &unit.type_params {
        v.visit_type_parameter(param);
    }
    for class in &unit.classes {
        v.visit_class(class);
    }
    for function in &unit.functions {
        v.visit_function(function);
    }
    for alias in &unit.aliases {
        v.visit_alias(alias);
    }
}

/// Walks bases, template, methods and attributes of a class.
pub fn walk_class<V: Visitor + ?Sized>(v: &mut V, class: &Class) {
    for parent in &class.parents {
        v.visit_type(parent);
    }
    for param in &class.template {
        v.visit_type_parameter(param);
    }
    for method in &class.methods {
        v.visit_function(method);
    }
    for constant in &class.constants {
        v.visit_constant(constant);
    }
}

/// Walks parameter and return types of every signature.
pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, function: &Function) {
    for signature in &function.signatures {
        for param in &signature.params {
            v.visit_type(&param.ty);
        }
        v.visit_type(&signature.return_type);
    }
}

/// Dispatches on the type variant and descends into composite types.
pub fn walk_type<V: Visitor + ?Sized>(v: &mut V, ty: &Type) {
    match ty {
        Type::Anything | Type::Nothing => {}
        Type::Named(n) => v.visit_named_type(n),
        Type::Class(c) => v.visit_class_type(c),
        Type::Late(l) => v.visit_late_type(l),
        Type::Param(p) => v.visit_type_parameter(p),
        Type::Generic(g) => {
            v.visit_type(&g.base);
            for p in &g.parameters {
                v.visit_type(p);
            }
        }
        Type::Union(u) => {
            for t in &u.types {
                v.visit_type(t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{MethodKind, Parameter, Signature};

    #[derive(Default)]
    struct Names(Vec<String>);

    impl Visitor for Names {
        fn visit_class_type(&mut self, node: &Arc<ClassType>) {
            self.0.push(node.name.clone());
        }
        fn visit_late_type(&mut self, node: &Arc<LateType>) {
            self.0.push(format!("late {}", node.name));
        }
    }

    #[test]
    fn visits_in_declaration_order() {
        let unit = Unit::new("m")
            .with_constant(Constant::new("m.c", Type::class("b.int")))
            .with_class(Class::new(
                "m.A",
                vec![Type::class("b.object")],
                vec![Function::new(
                    "f",
                    vec![Signature::new(
                        vec![Parameter::new(
                            "x",
                            Type::generic(Type::class("b.list"), vec![Type::late("o.X")]),
                        )],
                        Type::class("m.A"),
                    )],
                    MethodKind::Method,
                )],
                vec![],
            ))
            .with_alias(Alias::new("m.Al", Type::class("o.Y")));
        let mut names = Names::default();
        unit.visit(&mut names);
        assert_eq!(
            names.0,
            vec!["b.int", "b.object", "b.list", "late o.X", "m.A", "o.Y"]
        );
    }
}
