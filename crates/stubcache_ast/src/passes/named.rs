use std::convert::Infallible;
use std::sync::Arc;

use crate::transform::Transform;
use crate::types::{NamedType, Type};

/// Turns every remaining unclassified name into an unresolved class
/// reference. Run after the lookups that may classify a name differently.
#[derive(Debug, Default)]
pub struct NamedTypeToClassType;

impl Transform for NamedTypeToClassType {
    type Error = Infallible;

    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, Infallible> {
        Ok(Type::class(node.name.clone()))
    }
}
