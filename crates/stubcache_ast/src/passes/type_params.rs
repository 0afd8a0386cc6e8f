use std::convert::Infallible;
use std::sync::Arc;

use crate::decl::{Class, Function, TypeParameter};
use crate::transform::Transform;
use crate::visit::{self, Visitor};

/// Binds type-parameter uses to the declaration that scopes them.
///
/// Uses inside a module-level function get the function's name as scope.
/// A class binds the parameters used in its bases (its template); inside its
/// methods those keep the class scope and any other parameter is scoped to
/// `Class.method`. Module-level type variable declarations are not touched.
#[derive(Debug, Default)]
pub struct AdjustTypeParameters {
    class: Option<ClassScope>,
    function: Option<String>,
}

#[derive(Debug)]
struct ClassScope {
    name: String,
    template: Vec<String>,
}

#[derive(Default)]
struct TemplateNames(Vec<String>);

impl Visitor for TemplateNames {
    fn visit_type_parameter(&mut self, param: &Arc<TypeParameter>) {
        if !self.0.contains(&param.name) {
            self.0.push(param.name.clone());
        }
    }
}

impl AdjustTypeParameters {
    /// Creates the pass.
    pub fn new() -> Self {
        Self::default()
    }

    fn scope_for(&self, name: &str) -> Option<String> {
        match (&self.class, &self.function) {
            (Some(class), Some(method)) => {
                if class.template.iter().any(|t| t == name) {
                    Some(class.name.clone())
                } else {
                    Some(format!("{}.{method}", class.name))
                }
            }
            (Some(class), None) => Some(class.name.clone()),
            (None, Some(function)) => Some(function.clone()),
            (None, None) => None,
        }
    }
}

impl Transform for AdjustTypeParameters {
    type Error = Infallible;

    fn enter_class(&mut self, class: &Class) {
        let mut names = TemplateNames::default();
        for parent in &class.parents {
            visit::walk_type(&mut names, parent);
        }
        self.class = Some(ClassScope {
            name: class.name.clone(),
            template: names.0,
        });
    }

    fn leave_class(&mut self, _class: &Class) {
        self.class = None;
    }

    fn enter_function(&mut self, function: &Function) {
        self.function = Some(function.name.clone());
    }

    fn leave_function(&mut self, _function: &Function) {
        self.function = None;
    }

    fn transform_type_parameter(
        &mut self,
        param: Arc<TypeParameter>,
    ) -> Result<Arc<TypeParameter>, Infallible> {
        let Some(scope) = self.scope_for(&param.name) else {
            return Ok(param);
        };
        if param.scope.as_deref() == Some(scope.as_str()) {
            return Ok(param);
        }
        Ok(Arc::new(TypeParameter::scoped(param.name.clone(), scope)))
    }

    fn transform_class(&mut self, class: Arc<Class>) -> Result<Arc<Class>, Infallible> {
        let Some(scope) = &self.class else {
            return Ok(class);
        };
        let template: Vec<Arc<TypeParameter>> = scope
            .template
            .iter()
            .map(|name| Arc::new(TypeParameter::scoped(name.clone(), scope.name.clone())))
            .collect();
        let same = template.len() == class.template.len()
            && template.iter().zip(&class.template).all(|(a, b)| a == b);
        if same {
            return Ok(class);
        }
        Ok(Arc::new(Class {
            template,
            ..Class::clone(&class)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{MethodKind, Parameter, Signature};
    use crate::types::Type;
    use crate::unit::Unit;

    fn t() -> Type {
        Type::Param(Arc::new(TypeParameter::new("T")))
    }

    fn s() -> Type {
        Type::Param(Arc::new(TypeParameter::new("S")))
    }

    fn mentions_type_parameter(ty: &Type) -> bool {
        #[derive(Default)]
        struct Found(bool);
        impl Visitor for Found {
            fn visit_type_parameter(&mut self, _param: &Arc<TypeParameter>) {
                self.0 = true;
            }
        }
        let mut found = Found::default();
        visit::walk_type(&mut found, ty);
        found.0
    }

    fn scope_of(ty: &Type) -> Option<String> {
        match ty {
            Type::Param(p) => p.scope.clone(),
            other => panic!("expected type parameter, got {other:?}"),
        }
    }

    #[test]
    fn function_parameters_get_function_scope() {
        let unit = Unit::new("m").with_function(Function::new(
            "m.f",
            vec![Signature::new(vec![Parameter::new("x", t())], t())],
            MethodKind::Method,
        ));
        let out = unit.rewrite(&mut AdjustTypeParameters::new());
        let sig = &out.functions[0].signatures[0];
        assert_eq!(scope_of(&sig.params[0].ty).as_deref(), Some("m.f"));
        assert_eq!(scope_of(&sig.return_type).as_deref(), Some("m.f"));
    }

    #[test]
    fn class_template_and_method_scopes() {
        let generic = Type::generic(Type::class("typing.Generic"), vec![t()]);
        let unit = Unit::new("m").with_class(Class::new(
            "m.Box",
            vec![generic],
            vec![Function::new(
                "get",
                vec![Signature::new(vec![Parameter::new("other", s())], t())],
                MethodKind::Method,
            )],
            vec![],
        ));
        let out = unit.rewrite(&mut AdjustTypeParameters::new());
        let class = &out.classes[0];
        assert_eq!(class.template.len(), 1);
        assert_eq!(class.template[0].scope.as_deref(), Some("m.Box"));
        let sig = &class.methods[0].signatures[0];
        assert_eq!(scope_of(&sig.return_type).as_deref(), Some("m.Box"));
        assert_eq!(scope_of(&sig.params[0].ty).as_deref(), Some("m.Box.get"));
    }

    #[test]
    fn module_level_declarations_are_untouched() {
        let unit = Unit::new("m").with_type_param(TypeParameter::new("T"));
        let out = unit.rewrite(&mut AdjustTypeParameters::new());
        assert!(Arc::ptr_eq(&out.type_params[0], &unit.type_params[0]));
    }

    #[test]
    fn adjusting_twice_changes_nothing() {
        let unit = Unit::new("m").with_function(Function::new(
            "m.f",
            vec![Signature::new(vec![Parameter::new("x", t())], t())],
            MethodKind::Method,
        ));
        let once = unit.rewrite(&mut AdjustTypeParameters::new());
        let twice = once.rewrite(&mut AdjustTypeParameters::new());
        assert!(Arc::ptr_eq(&once.functions[0], &twice.functions[0]));
        assert!(mentions_type_parameter(&twice.functions[0].signatures[0].return_type));
    }
}
