use std::convert::Infallible;
use std::sync::Arc;

use crate::transform::Transform;
use crate::types::{ClassType, Type};

/// Replaces class references by lazy name-only references.
///
/// References whose name starts with one of the `ignore` prefixes stay class
/// references. Prefixes are matched literally, so `"module."` protects
/// `module.X` but not `modules.X`.
#[derive(Debug, Default)]
pub struct ClassTypeToLateType {
    ignore: Vec<String>,
}

impl ClassTypeToLateType {
    /// Creates the pass with the given protected prefixes.
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore.into_iter().map(Into::into).collect(),
        }
    }

    fn is_protected(&self, name: &str) -> bool {
        self.ignore.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl Transform for ClassTypeToLateType {
    type Error = Infallible;

    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, Infallible> {
        if self.is_protected(&node.name) {
            Ok(Type::Class(node))
        } else {
            Ok(Type::late(node.name.clone()))
        }
    }
}
