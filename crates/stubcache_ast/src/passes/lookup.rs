use std::sync::Arc;

use crate::error::LookupError;
use crate::transform::Transform;
use crate::types::{ClassType, NamedType, Type};
use crate::unit::{Member, ModuleLookup};

use super::split_name;

/// Resolves references to other modules through a module lookup.
///
/// References whose module is `self_name` are skipped so they can be filled
/// once the module itself is final; passing `None` resolves every dotted
/// reference. Undotted names and already-linked references are left alone.
///
/// When the referenced member is a class, the reference's target slot is
/// written in place and the same node is returned. Any other member kind
/// yields a different node: an alias is replaced by what it aliases, a
/// function or constant by `Any`.
pub struct LookupExternalTypes<'a, M: ModuleLookup + ?Sized> {
    modules: &'a M,
    self_name: Option<&'a str>,
}

impl<'a, M: ModuleLookup + ?Sized> LookupExternalTypes<'a, M> {
    /// Creates a resolver over `modules`, skipping `self_name`.
    pub fn new(modules: &'a M, self_name: Option<&'a str>) -> Self {
        Self { modules, self_name }
    }

    fn member(&self, module_name: &str, name: &str, short: &str) -> Result<Member<'a>, LookupError> {
        let modules: &'a M = self.modules;
        let module = modules
            .module(module_name)
            .ok_or_else(|| LookupError::UnknownModule {
                module: module_name.to_string(),
                name: name.to_string(),
            })?;
        module
            .lookup_member(short)
            .ok_or_else(|| LookupError::UnknownMember {
                name: name.to_string(),
            })
    }

    /// Resolves one class reference.
    ///
    /// Returns the same node when nothing had to change structurally (the
    /// reference was skipped, already linked, or now linked in place).
    pub fn resolve_class_type(&self, node: &Arc<ClassType>) -> Result<Type, LookupError> {
        if node.is_resolved() {
            return Ok(Type::Class(Arc::clone(node)));
        }
        let Some((module_name, short)) = split_name(&node.name) else {
            return Ok(Type::Class(Arc::clone(node)));
        };
        if self.self_name == Some(module_name) {
            return Ok(Type::Class(Arc::clone(node)));
        }
        match self.member(module_name, &node.name, short)? {
            Member::Class(cls) => {
                node.set_cls(cls);
                Ok(Type::Class(Arc::clone(node)))
            }
            Member::Alias(alias) => {
                tracing::trace!(name = %node.name, "reference resolved through alias");
                Ok(alias.ty.clone())
            }
            _ => Ok(Type::Anything),
        }
    }

    fn resolve_named_type(&self, node: Arc<NamedType>) -> Result<Type, LookupError> {
        let Some((module_name, short)) = split_name(&node.name) else {
            return Ok(Type::Named(node));
        };
        if self.self_name == Some(module_name) {
            return Ok(Type::Named(node));
        }
        match self.member(module_name, &node.name, short)? {
            Member::Class(cls) => Ok(Type::Class(Arc::new(ClassType::resolved(
                cls.name.clone(),
                cls,
            )))),
            Member::Alias(alias) => Ok(alias.ty.clone()),
            _ => Ok(Type::Anything),
        }
    }
}

impl<M: ModuleLookup + ?Sized> Transform for LookupExternalTypes<'_, M> {
    type Error = LookupError;

    fn transform_class_type(&mut self, node: Arc<ClassType>) -> Result<Type, LookupError> {
        self.resolve_class_type(&node)
    }

    fn transform_named_type(&mut self, node: Arc<NamedType>) -> Result<Type, LookupError> {
        self.resolve_named_type(node)
    }
}
