//! Rebuilding tree transforms with structural sharing.
//!
//! A [`Transform`] supplies per-node-kind hooks. The walk functions in this
//! module rebuild the tree bottom-up: children are transformed first, the
//! parent is reallocated only if at least one child came back as a different
//! node, and then the parent's own hook runs. A hook that returns its input
//! unchanged keeps the original `Arc`, so untouched subtrees are shared
//! between the old and new tree.
//!
//! `enter_*`/`leave_*` notifications bracket the walk of classes and
//! functions for transforms that need scope context.

use std::sync::Arc;

use crate::decl::{Alias, Class, Constant, Function, Parameter, Signature, TypeParameter};
use crate::types::{ClassType, GenericType, LateType, NamedType, Type, UnionType};
use crate::unit::Unit;

/// Per-node-kind hooks for a rebuilding pass. Every hook defaults to the
/// identity.
pub trait Transform {
    /// Error raised by fallible hooks. Use [`std::convert::Infallible`] for
    /// passes that cannot fail.
    type Error;

    /// Called before anything in the unit is walked.
    fn enter_unit(&mut self, _unit: &Unit) {}

    /// Called before a class's children are walked.
    fn enter_class(&mut self, _class: &Class) {}

    /// Called after [`Transform::transform_class`] for the class.
    fn leave_class(&mut self, _class: &Class) {}

    /// Called before a function's signatures are walked.
    fn enter_function(&mut self, _function: &Function) {}

    /// Called after [`Transform::transform_function`] for the function.
    fn leave_function(&mut self, _function: &Function) {}

    /// Rewrites the rebuilt root.
    fn transform_unit(&mut self, unit: Unit) -> Result<Unit, Self::Error> {
        Ok(unit)
    }

    /// Rewrites a class after its children.
    fn transform_class(&mut self, class: Arc<Class>) -> Result<Arc<Class>, Self::Error> {
        Ok(class)
    }

    /// Rewrites a function after its signatures.
    fn transform_function(&mut self, function: Arc<Function>) -> Result<Arc<Function>, Self::Error> {
        Ok(function)
    }

    /// Rewrites a parameter after its type.
    fn transform_parameter(&mut self, param: Parameter) -> Result<Parameter, Self::Error> {
        Ok(param)
    }

    /// Rewrites a constant after its type.
    fn transform_constant(&mut self, constant: Arc<Constant>) -> Result<Arc<Constant>, Self::Error> {
        Ok(constant)
    }

    /// Rewrites an alias after its type.
    fn transform_alias(&mut self, alias: Arc<Alias>) -> Result<Arc<Alias>, Self::Error> {
        Ok(alias)
    }

    /// Rewrites a type parameter, wherever it appears.
    fn transform_type_parameter(
        &mut self,
        param: Arc<TypeParameter>,
    ) -> Result<Arc<TypeParameter>, Self::Error> {
        Ok(param)
    }

    /// Rewrites an unclassified name.
    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, Self::Error> {
        Ok(Type::Named(node))
    }

    /// Rewrites a class reference.
    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, Self::Error> {
        Ok(Type::Class(node))
    }

    /// Rewrites a lazy reference.
    fn transform_late_type(&mut self, node: Arc<LateType>) -> Result<Type, Self::Error> {
        Ok(Type::Late(node))
    }

    /// Rewrites a parameterized type after its base and arguments.
    fn transform_generic_type(&mut self, node: Arc<GenericType>) -> Result<Type, Self::Error> {
        Ok(Type::Generic(node))
    }

    /// Rewrites a union after its alternatives.
    fn transform_union_type(&mut self, node: Arc<UnionType>) -> Result<Type, Self::Error> {
        Ok(Type::Union(node))
    }
}

fn same_arcs<X>(a: &[Arc<X>], b: &[Arc<X>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}

fn same_types(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_same(y))
}

/// Transforms a whole unit.
pub fn transform_unit<T: Transform + ?Sized>(t: &mut T, unit: &Unit) -> Result<Unit, T::Error> {
    t.enter_unit(unit);
    let constants = unit
        .constants
        .iter()
        .map(|c| transform_constant(t, c))
        .collect::<Result<Vec<_>, _>>()?;
    let type_params = unit
        .type_params
        .iter()
        .map(|p| t.transform_type_parameter(Arc::clone(p)))
        .collect::<Result<Vec<_>, _>>()?;
    let classes = unit
        .classes
        .iter()
        .map(|c| transform_class(t, c))
        .collect::<Result<Vec<_>, _>>()?;
    let functions = unit
        .functions
        .iter()
        .map(|f| transform_function(t, f))
        .collect::<Result<Vec<_>, _>>()?;
    let aliases = unit
        .aliases
        .iter()
        .map(|a| transform_alias(t, a))
        .collect::<Result<Vec<_>, _>>()?;
    t.transform_unit(Unit {
        name: unit.name.clone(),
        constants,
        type_params,
        classes,
        functions,
        aliases,
    })
}

/// Transforms a class and everything below it.
pub fn transform_class<T: Transform + ?Sized>(
    t: &mut T,
    class: &Arc<Class>,
) -> Result<Arc<Class>, T::Error> {
    t.enter_class(class);
    let parents = transform_types(t, &class.parents)?;
    let template = class
        .template
        .iter()
        .map(|p| t.transform_type_parameter(Arc::clone(p)))
        .collect::<Result<Vec<_>, _>>()?;
    let methods = class
        .methods
        .iter()
        .map(|m| transform_function(t, m))
        .collect::<Result<Vec<_>, _>>()?;
    let constants = class
        .constants
        .iter()
        .map(|c| transform_constant(t, c))
        .collect::<Result<Vec<_>, _>>()?;

    let unchanged = same_types(&parents, &class.parents)
        && same_arcs(&template, &class.template)
        && same_arcs(&methods, &class.methods)
        && same_arcs(&constants, &class.constants);
    let node = if unchanged {
        Arc::clone(class)
    } else {
        Arc::new(Class {
            name: class.name.clone(),
            parents,
            methods,
            constants,
            template,
        })
    };
    let result = t.transform_class(node);
    t.leave_class(class);
    result
}

/// Transforms a function and its signatures.
pub fn transform_function<T: Transform + ?Sized>(
    t: &mut T,
    function: &Arc<Function>,
) -> Result<Arc<Function>, T::Error> {
    t.enter_function(function);
    let signatures = function
        .signatures
        .iter()
        .map(|s| transform_signature(t, s))
        .collect::<Result<Vec<_>, _>>()?;
    let node = if same_arcs(&signatures, &function.signatures) {
        Arc::clone(function)
    } else {
        Arc::new(Function {
            name: function.name.clone(),
            signatures,
            kind: function.kind,
        })
    };
    let result = t.transform_function(node);
    t.leave_function(function);
    result
}

fn transform_signature<T: Transform + ?Sized>(
    t: &mut T,
    signature: &Arc<Signature>,
) -> Result<Arc<Signature>, T::Error> {
    let mut changed = false;
    let mut params = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        let ty = transform_type(t, &param.ty)?;
        let rebuilt = t.transform_parameter(Parameter {
            name: param.name.clone(),
            ty,
            kind: param.kind,
            optional: param.optional,
        })?;
        changed |= !rebuilt.ty.is_same(&param.ty)
            || rebuilt.name != param.name
            || rebuilt.kind != param.kind
            || rebuilt.optional != param.optional;
        params.push(rebuilt);
    }
    let return_type = transform_type(t, &signature.return_type)?;
    changed |= !return_type.is_same(&signature.return_type);
    Ok(if changed {
        Arc::new(Signature {
            params,
            return_type,
        })
    } else {
        Arc::clone(signature)
    })
}

fn transform_constant<T: Transform + ?Sized>(
    t: &mut T,
    constant: &Arc<Constant>,
) -> Result<Arc<Constant>, T::Error> {
    let ty = transform_type(t, &constant.ty)?;
    let node = if ty.is_same(&constant.ty) {
        Arc::clone(constant)
    } else {
        Arc::new(Constant {
            name: constant.name.clone(),
            ty,
        })
    };
    t.transform_constant(node)
}

fn transform_alias<T: Transform + ?Sized>(
    t: &mut T,
    alias: &Arc<Alias>,
) -> Result<Arc<Alias>, T::Error> {
    let ty = transform_type(t, &alias.ty)?;
    let node = if ty.is_same(&alias.ty) {
        Arc::clone(alias)
    } else {
        Arc::new(Alias {
            name: alias.name.clone(),
            ty,
        })
    };
    t.transform_alias(node)
}

fn transform_types<T: Transform + ?Sized>(t: &mut T, types: &[Type]) -> Result<Vec<Type>, T::Error> {
    types.iter().map(|ty| transform_type(t, ty)).collect()
}

/// Transforms a single type expression.
pub fn transform_type<T: Transform + ?Sized>(t: &mut T, ty: &Type) -> Result<Type, T::Error> {
    match ty {
        Type::Anything | Type::Nothing => Ok(ty.clone()),
        Type::Named(n) => t.transform_named_type(Arc::clone(n)),
        Type::Class(c) => t.transform_class_type(Arc::clone(c)),
        Type::Late(l) => t.transform_late_type(Arc::clone(l)),
        Type::Param(p) => Ok(Type::Param(t.transform_type_parameter(Arc::clone(p))?)),
        Type::Generic(g) => {
            let base = transform_type(t, &g.base)?;
            let parameters = transform_types(t, &g.parameters)?;
            let node = if base.is_same(&g.base) && same_types(&parameters, &g.parameters) {
                Arc::clone(g)
            } else {
                Arc::new(GenericType { base, parameters })
            };
            t.transform_generic_type(node)
        }
        Type::Union(u) => {
            let types = transform_types(t, &u.types)?;
            let node = if same_types(&types, &u.types) {
                Arc::clone(u)
            } else {
                Arc::new(UnionType { types })
            };
            t.transform_union_type(node)
        }
    }
}
