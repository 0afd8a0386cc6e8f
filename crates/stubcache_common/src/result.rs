//! Result and error types for invariant violations.

/// Result type for operations whose only failure mode is a broken invariant.
pub type StubResult<T> = Result<T, InternalError>;

/// An integration or programming error, never a data error.
///
/// Raised when a caller breaks a contract (for example renaming from an empty
/// module name) or when a pass leaves the tree in a state it promised not to.
/// These errors abort the current operation and are never recovered from.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("pointer still unset");
        assert_eq!(format!("{err}"), "internal error: pointer still unset");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }

    #[test]
    fn err_path() {
        let r: StubResult<()> = Err(InternalError::new("broken"));
        assert_eq!(r.unwrap_err().message, "broken");
    }
}
