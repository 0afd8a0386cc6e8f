//! Errors raised while resolving names against loaded modules.

/// A name could not be resolved.
///
/// Both variants carry the fully qualified name that was being looked up so
/// callers can report exactly which reference is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The module part of the name is not loaded.
    #[error("unresolved name '{name}': module '{module}' is not loaded")]
    UnknownModule {
        /// The module that was looked up.
        module: String,
        /// The full name being resolved.
        name: String,
    },

    /// The module is loaded but has no member with that name.
    #[error("unresolved name '{name}'")]
    UnknownMember {
        /// The full name being resolved.
        name: String,
    },
}

impl LookupError {
    /// Returns the name that failed to resolve.
    pub fn name(&self) -> &str {
        match self {
            LookupError::UnknownModule { name, .. } | LookupError::UnknownMember { name } => name,
        }
    }
}
