use std::cmp::Ordering;
use std::convert::Infallible;
use std::sync::Arc;

use crate::decl::Class;
use crate::transform::Transform;
use crate::types::{Type, UnionType};
use crate::unit::Unit;

/// Sorts declarations so that equivalent trees compare equal.
///
/// Module-level declarations and class members are sorted by name, union
/// alternatives by their printed form. Overload order is significant and is
/// kept. Sorting is stable, so same-named entries keep their relative order.
#[derive(Debug, Default)]
pub struct CanonicalOrdering;

fn sorted_by<X: Clone>(items: &[X], cmp: impl Fn(&X, &X) -> Ordering) -> Option<Vec<X>> {
    let in_order = items.windows(2).all(|w| cmp(&w[0], &w[1]) != Ordering::Greater);
    if in_order {
        return None;
    }
    let mut sorted = items.to_vec();
    sorted.sort_by(cmp);
    Some(sorted)
}

impl Transform for CanonicalOrdering {
    type Error = Infallible;

    fn transform_unit(&mut self, mut unit: Unit) -> Result<Unit, Infallible> {
        unit.constants.sort_by(|a, b| a.name.cmp(&b.name));
        unit.type_params.sort_by(|a, b| a.name.cmp(&b.name));
        unit.classes.sort_by(|a, b| a.name.cmp(&b.name));
        unit.functions.sort_by(|a, b| a.name.cmp(&b.name));
        unit.aliases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(unit)
    }

    fn transform_class(&mut self, class: Arc<Class>) -> Result<Arc<Class>, Infallible> {
        let methods = sorted_by(&class.methods, |a, b| a.name.cmp(&b.name));
        let constants = sorted_by(&class.constants, |a, b| a.name.cmp(&b.name));
        if methods.is_none() && constants.is_none() {
            return Ok(class);
        }
        Ok(Arc::new(Class {
            name: class.name.clone(),
            parents: class.parents.clone(),
            methods: methods.unwrap_or_else(|| class.methods.clone()),
            constants: constants.unwrap_or_else(|| class.constants.clone()),
            template: class.template.clone(),
        }))
    }

    fn transform_union_type(&mut self, node: Arc<UnionType>) -> Result<Type, Infallible> {
        match sorted_by(&node.types, |a, b| a.to_string().cmp(&b.to_string())) {
            Some(types) => Ok(Type::Union(Arc::new(UnionType { types }))),
            None => Ok(Type::Union(node)),
        }
    }
}
