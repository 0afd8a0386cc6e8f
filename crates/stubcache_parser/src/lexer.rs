//! Lexical analyzer for stub source text.
//!
//! Converts source text into a sequence of [`Token`]s. Indentation at the
//! start of a logical line is turned into `Indent`/`Dedent` tokens, comments
//! and blank lines are skipped, and line breaks inside brackets or after a
//! backslash continue the logical line.

use crate::error::ParseError;
use crate::token::{lookup_keyword, Token, TokenKind};

/// Lexes the given stub source into a vector of tokens.
///
/// The returned vector always ends with a [`TokenKind::Eof`] token, preceded
/// by a `Newline` for the last logical line and one `Dedent` per indentation
/// level still open.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
        depth: 0,
        indents: vec![0],
        at_line_start: true,
        tokens: Vec::new(),
    };
    lexer.lex_all()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    /// Bracket nesting depth; line breaks are insignificant while positive.
    depth: u32,
    indents: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Result<(), ParseError> {
        loop {
            if self.at_line_start && self.depth == 0 {
                self.indentation()?;
            }
            self.skip_spaces();
            if self.pos >= self.bytes.len() {
                break;
            }
            match self.peek() {
                b'#' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'\n' => {
                    self.pos += 1;
                    if self.depth == 0 {
                        self.end_line();
                        self.at_line_start = true;
                    }
                    self.line += 1;
                }
                b'\\' if self.peek_at(1) == b'\n' => {
                    self.pos += 2;
                    self.line += 1;
                }
                _ => self.next_token()?,
            }
        }
        if self.depth > 0 {
            return Err(ParseError::new(self.line, "unexpected end of input inside brackets"));
        }
        self.end_line();
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, "");
        }
        self.push(TokenKind::Eof, "");
        Ok(())
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn push(&mut self, kind: TokenKind, text: &str) {
        self.tokens.push(Token {
            kind,
            text: text.to_string(),
            line: self.line,
        });
    }

    fn end_line(&mut self) {
        let needs_newline = self
            .tokens
            .last()
            .is_some_and(|t| t.kind != TokenKind::Newline);
        if needs_newline {
            self.push(TokenKind::Newline, "");
        }
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), b' ' | b'\t' | b'\r' | b'\x0c') {
            self.pos += 1;
        }
    }

    /// Measures the indentation of a new line and emits layout tokens.
    /// Blank and comment-only lines leave the indentation stack alone.
    fn indentation(&mut self) -> Result<(), ParseError> {
        let mut column = 0;
        loop {
            match self.peek() {
                b' ' => column += 1,
                b'\t' => column = (column / 8 + 1) * 8,
                b'\r' | b'\x0c' => {}
                _ => break,
            }
            self.pos += 1;
        }
        if matches!(self.peek(), b'\n' | b'#' | 0) {
            return Ok(());
        }
        self.at_line_start = false;
        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            self.indents.push(column);
            self.push(TokenKind::Indent, "");
        } else {
            while self.indents.last().is_some_and(|&level| level > column) {
                self.indents.pop();
                self.push(TokenKind::Dedent, "");
            }
            if self.indents.last() != Some(&column) {
                return Err(ParseError::new(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let b = self.peek();

        if b.is_ascii_alphabetic() || b == b'_' {
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.pos += 1;
            }
            let text = &self.source[start..self.pos];
            let kind = lookup_keyword(text).unwrap_or(TokenKind::Name);
            self.push(kind, text);
            return Ok(());
        }

        if b.is_ascii_digit() {
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
            let text = &self.source[start..self.pos];
            self.push(TokenKind::Number, text);
            return Ok(());
        }

        if b == b'"' || b == b'\'' {
            return self.lex_string(start, b);
        }

        let (kind, len) = match (b, self.peek_at(1), self.peek_at(2)) {
            (b'.', b'.', b'.') => (TokenKind::Ellipsis, 3),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b'-', b'>', _) => (TokenKind::Arrow, 2),
            (b'-', _, _) => (TokenKind::Minus, 1),
            (b'*', b'*', _) => (TokenKind::DoubleStar, 2),
            (b'*', _, _) => (TokenKind::Star, 1),
            (b'=', b'=', _) => (TokenKind::EqualEqual, 2),
            (b'=', _, _) => (TokenKind::Equals, 1),
            (b'!', b'=', _) => (TokenKind::NotEqual, 2),
            (b'<', b'=', _) => (TokenKind::LessEqual, 2),
            (b'<', _, _) => (TokenKind::Less, 1),
            (b'>', b'=', _) => (TokenKind::GreaterEqual, 2),
            (b'>', _, _) => (TokenKind::Greater, 1),
            (b'(', _, _) => (TokenKind::LeftParen, 1),
            (b')', _, _) => (TokenKind::RightParen, 1),
            (b'[', _, _) => (TokenKind::LeftBracket, 1),
            (b']', _, _) => (TokenKind::RightBracket, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b'|', _, _) => (TokenKind::Pipe, 1),
            (b'/', _, _) => (TokenKind::Slash, 1),
            (b'@', _, _) => (TokenKind::At, 1),
            _ => {
                let c = self.source[start..].chars().next().unwrap_or('?');
                return Err(ParseError::new(
                    self.line,
                    format!("unexpected character '{c}'"),
                ));
            }
        };
        match kind {
            TokenKind::LeftParen | TokenKind::LeftBracket => self.depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }
        self.pos += len;
        let text = &self.source[start..self.pos];
        self.push(kind, text);
        Ok(())
    }

    fn lex_string(&mut self, start: usize, quote: u8) -> Result<(), ParseError> {
        let line = self.line;
        let triple = self.peek_at(1) == quote && self.peek_at(2) == quote;
        let delimiter = if triple { 3 } else { 1 };
        self.pos += delimiter;
        loop {
            match self.peek() {
                0 if self.pos >= self.bytes.len() => {
                    return Err(ParseError::new(line, "unterminated string literal"));
                }
                b'\\' => self.pos += 2,
                b'\n' if !triple => {
                    return Err(ParseError::new(line, "unterminated string literal"));
                }
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c == quote
                    && (!triple || (self.peek_at(1) == quote && self.peek_at(2) == quote)) =>
                {
                    self.pos += delimiter;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        let end = self.pos.min(self.bytes.len());
        let text = &self.source[start..end];
        self.tokens.push(Token {
            kind: TokenKind::String,
            text: text.to_string(),
            line,
        });
        Ok(())
    }
}
