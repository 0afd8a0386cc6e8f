//! Renaming a module inside its own declaration tree.

use std::convert::Infallible;
use std::sync::Arc;

use stubcache_ast::{
    Alias, Class, ClassType, Constant, Function, NamedType, Transform, Type, TypeParameter, Unit,
};
use stubcache_common::{InternalError, StubResult};

/// Moves a tree from one module name to another.
///
/// The root always receives the new name. Every other name is rewritten only
/// when it is a direct member of the old module: with `old = "a.b"`,
/// `a.b.C` becomes `new.C` while `a.b.C.D` and `a.bc.E` are left alone.
/// Class references keep their target link when renamed.
#[derive(Debug, Clone)]
pub struct RenameModule {
    old_prefix: String,
    new_prefix: String,
    new_name: String,
}

impl RenameModule {
    /// Creates a renamer from `old_name` to `new_name`.
    ///
    /// An empty `old_name` is a caller bug and is rejected. An empty
    /// `new_name` strips the module prefix from direct members.
    pub fn new(old_name: &str, new_name: &str) -> StubResult<Self> {
        if old_name.is_empty() {
            return Err(InternalError::new(format!(
                "cannot rename an unnamed module to '{new_name}'"
            )));
        }
        let new_prefix = if new_name.is_empty() {
            String::new()
        } else {
            format!("{new_name}.")
        };
        Ok(Self {
            old_prefix: format!("{old_name}."),
            new_prefix,
            new_name: new_name.to_string(),
        })
    }

    /// Returns the renamed form of `name`, or `None` if it is not a direct
    /// member of the old module.
    pub fn new_name_for(&self, name: &str) -> Option<String> {
        let member = name.strip_prefix(self.old_prefix.as_str())?;
        if member.contains('.') {
            return None;
        }
        Some(format!("{}{member}", self.new_prefix))
    }

    /// Applies the rename to a whole tree.
    pub fn apply(&mut self, tree: &Unit) -> Unit {
        tracing::debug!(from = %tree.name, to = %self.new_name, "renaming module");
        tree.rewrite(self)
    }
}

impl Transform for RenameModule {
    type Error = Infallible;

    fn transform_unit(&mut self, unit: Unit) -> Result<Unit, Infallible> {
        Ok(Unit {
            name: self.new_name.clone(),
            ..unit
        })
    }

    fn transform_class(&mut self, class: Arc<Class>) -> Result<Arc<Class>, Infallible> {
        Ok(match self.new_name_for(&class.name) {
            Some(name) => Arc::new(Class {
                name,
                ..Class::clone(&class)
            }),
            None => class,
        })
    }

    fn transform_function(&mut self, function: Arc<Function>) -> Result<Arc<Function>, Infallible> {
        Ok(match self.new_name_for(&function.name) {
            Some(name) => Arc::new(Function {
                name,
                ..Function::clone(&function)
            }),
            None => function,
        })
    }

    fn transform_constant(&mut self, constant: Arc<Constant>) -> Result<Arc<Constant>, Infallible> {
        Ok(match self.new_name_for(&constant.name) {
            Some(name) => Arc::new(Constant {
                name,
                ty: constant.ty.clone(),
            }),
            None => constant,
        })
    }

    fn transform_alias(&mut self, alias: Arc<Alias>) -> Result<Arc<Alias>, Infallible> {
        Ok(match self.new_name_for(&alias.name) {
            Some(name) => Arc::new(Alias {
                name,
                ty: alias.ty.clone(),
            }),
            None => alias,
        })
    }

    fn transform_type_parameter(
        &mut self,
        param: Arc<TypeParameter>,
    ) -> Result<Arc<TypeParameter>, Infallible> {
        let scope = param.scope.as_deref().and_then(|s| self.new_name_for(s));
        Ok(match scope {
            Some(scope) => Arc::new(TypeParameter::scoped(param.name.clone(), scope)),
            None => param,
        })
    }

    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, Infallible> {
        Ok(match self.new_name_for(&node.name) {
            Some(name) => Type::named(name),
            None => Type::Named(node),
        })
    }

    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, Infallible> {
        Ok(match self.new_name_for(&node.name) {
            Some(name) => Type::Class(Arc::new(node.renamed(name))),
            None => Type::Class(node),
        })
    }
}
