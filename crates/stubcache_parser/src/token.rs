//! Token types for the stub lexer.
//!
//! Defines the [`TokenKind`] enum covering the keywords, punctuation and
//! literals of the stub syntax, plus the [`Token`] struct pairing a kind with
//! its text and source line.

/// A stub token kind.
///
/// Indentation is tokenized: every increase of the indentation level yields an
/// [`TokenKind::Indent`], every decrease one [`TokenKind::Dedent`] per closed
/// level. Line breaks inside brackets are not reported.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    // === Keywords ===
    /// `as`
    As,
    /// `class`
    Class,
    /// `def`
    Def,
    /// `elif`
    Elif,
    /// `else`
    Else,
    /// `from`
    From,
    /// `if`
    If,
    /// `import`
    Import,
    /// `pass`
    Pass,

    // === Literals ===
    /// An identifier.
    Name,
    /// A decimal integer.
    Number,
    /// A single- or double-quoted string.
    String,

    // === Punctuation ===
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `...`
    Ellipsis,
    /// `->`
    Arrow,
    /// `=`
    Equals,
    /// `|`
    Pipe,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `@`
    At,
    /// `-`
    Minus,

    // === Comparisons ===
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // === Layout ===
    /// End of a logical line.
    Newline,
    /// Indentation increased.
    Indent,
    /// Indentation decreased by one level.
    Dedent,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns `true` for the comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::EqualEqual
                | TokenKind::NotEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
        )
    }
}

/// A token with its text and the 1-based line it starts on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Source text; empty for layout tokens.
    pub text: String,
    /// 1-based source line.
    pub line: u32,
}

/// Looks up a keyword by its text.
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    match text {
        "as" => Some(TokenKind::As),
        "class" => Some(TokenKind::Class),
        "def" => Some(TokenKind::Def),
        "elif" => Some(TokenKind::Elif),
        "else" => Some(TokenKind::Else),
        "from" => Some(TokenKind::From),
        "if" => Some(TokenKind::If),
        "import" => Some(TokenKind::Import),
        "pass" => Some(TokenKind::Pass),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert_eq!(lookup_keyword("class"), Some(TokenKind::Class));
        assert_eq!(lookup_keyword("def"), Some(TokenKind::Def));
        assert_eq!(lookup_keyword("Class"), None);
        assert_eq!(lookup_keyword("self"), None);
    }

    #[test]
    fn comparison_predicate() {
        assert!(TokenKind::GreaterEqual.is_comparison());
        assert!(TokenKind::NotEqual.is_comparison());
        assert!(!TokenKind::Arrow.is_comparison());
    }
}
