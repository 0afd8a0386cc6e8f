//! Parse errors.

/// A syntax error in stub source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line of the offending token.
    pub line: u32,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    /// Creates an error at `line`.
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line() {
        let err = ParseError::new(7, "expected ':'");
        assert_eq!(err.to_string(), "line 7: expected ':'");
    }
}
