//! Recursive descent parser for stub source text.
//!
//! The [`StubParser`] struct provides the primitive token operations (advance,
//! expect, eat) and the grammar rules for module bodies, classes, functions,
//! version conditionals and type expressions. Parsing stops at the first
//! error.

use stubcache_ast::{
    Alias, Class, Constant, Function, MethodKind, ParamKind, Parameter, Signature, Type,
    TypeParameter, Unit,
};
use stubcache_common::PythonVersion;

use crate::error::ParseError;
use crate::token::{Token, TokenKind};

/// Typing constructs the parser understands natively. Importing them does not
/// create an alias.
const TYPING_SPECIAL_FORMS: &[&str] = &[
    "Any", "Never", "NoReturn", "Optional", "TypeVar", "Union", "overload",
];

/// Module prefixes whose special forms are recognized when written qualified.
const TYPING_MODULES: &[&str] = &["typing", "typing_extensions"];

/// The qualified name `None` annotations refer to.
pub const NONE_TYPE: &str = "builtins.NoneType";

/// Where a statement appears. Classes cannot nest and module-level names are
/// qualified with the module name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Context {
    Module,
    Class,
}

/// Declarations collected from one block.
#[derive(Default)]
struct Body {
    constants: Vec<Constant>,
    type_params: Vec<TypeParameter>,
    classes: Vec<Class>,
    functions: Vec<Function>,
    aliases: Vec<Alias>,
}

impl Body {
    /// Adds a signature, merging it into an earlier definition of the same
    /// name.
    fn add_signature(&mut self, name: String, kind: MethodKind, signature: Signature) {
        match self.functions.iter_mut().find(|f| f.name == name) {
            Some(function) => function.signatures.push(signature.into()),
            None => self
                .functions
                .push(Function::new(name, vec![signature], kind)),
        }
    }

    fn into_unit(self, name: &str) -> Unit {
        let mut unit = Unit::new(name);
        unit.constants = self.constants.into_iter().map(Into::into).collect();
        unit.type_params = self.type_params.into_iter().map(Into::into).collect();
        unit.classes = self.classes.into_iter().map(Into::into).collect();
        unit.functions = self.functions.into_iter().map(Into::into).collect();
        unit.aliases = self.aliases.into_iter().map(Into::into).collect();
        unit
    }

    fn into_class(self, name: String, parents: Vec<Type>) -> Class {
        Class::new(name, parents, self.functions, self.constants)
    }
}

/// A recursive descent parser over a token stream produced by the lexer.
pub struct StubParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    module: &'a str,
    version: PythonVersion,
}

impl<'a> StubParser<'a> {
    /// Creates a parser for the declarations of `module`.
    ///
    /// `version` selects the branches of `sys.version_info` conditionals.
    pub fn new(tokens: Vec<Token>, module: &'a str, version: PythonVersion) -> Self {
        Self {
            tokens,
            pos: 0,
            module,
            version,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    fn token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current(&self) -> TokenKind {
        self.token().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn current_text(&self) -> &str {
        self.token().map_or("", |t| t.text.as_str())
    }

    fn line(&self) -> u32 {
        self.token()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.expected(what))
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        if self.at(TokenKind::Name) {
            let text = self.current_text().to_string();
            self.advance();
            Ok(text)
        } else {
            Err(self.expected("identifier"))
        }
    }

    /// Ends a simple statement. The end of input counts as a line break.
    fn expect_newline(&mut self) -> Result<(), ParseError> {
        if self.at_eof() || self.eat(TokenKind::Newline) {
            Ok(())
        } else {
            Err(self.expected("end of line"))
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line(), message)
    }

    fn expected(&self, what: &str) -> ParseError {
        let found = match self.current_text() {
            "" => format!("{:?}", self.current()),
            text => format!("'{text}'"),
        };
        self.error(format!("expected {what}, found {found}"))
    }

    /// Skips the rest of the logical line, including its line break.
    fn skip_line(&mut self) {
        while !self.at_eof() && !self.at(TokenKind::Newline) {
            self.advance();
        }
        self.eat(TokenKind::Newline);
    }

    /// Skips a bracketed group starting at the current opening bracket.
    fn skip_group(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.current() {
                TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket => depth = depth.saturating_sub(1),
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    /// Skips a default value up to the next `,`, `)` or line break at the
    /// same nesting.
    fn skip_default(&mut self) {
        while !matches!(
            self.current(),
            TokenKind::Eof | TokenKind::Comma | TokenKind::RightParen | TokenKind::Newline
        ) {
            if matches!(self.current(), TokenKind::LeftParen | TokenKind::LeftBracket) {
                self.skip_group();
            } else {
                self.advance();
            }
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.module.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.module)
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Parses a complete stub file.
    pub fn parse_unit(&mut self) -> Result<Unit, ParseError> {
        let mut body = Body::default();
        while !self.at_eof() {
            self.parse_statement(&mut body, Context::Module)?;
        }
        Ok(body.into_unit(self.module))
    }

    fn parse_statement(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        match self.current() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Pass | TokenKind::Ellipsis | TokenKind::String => {
                self.advance();
                self.expect_newline()
            }
            TokenKind::Import => {
                self.skip_line();
                Ok(())
            }
            TokenKind::From => self.parse_from_import(body, ctx),
            TokenKind::At => self.parse_decorated(body, ctx),
            TokenKind::Def => self.parse_def(body, ctx, MethodKind::Method),
            TokenKind::Class if ctx == Context::Class => {
                Err(self.error("nested classes are not supported"))
            }
            TokenKind::Class => self.parse_class(body),
            TokenKind::If => self.parse_conditional(body, ctx),
            TokenKind::Name => self.parse_assignment(body, ctx),
            _ => Err(self.expected("declaration")),
        }
    }

    /// `from a.b import X as Y, Z` becomes the aliases `Y = a.b.X` and
    /// `Z = a.b.Z`. Relative and `__future__` imports are ignored, as are the
    /// typing constructs the parser handles itself.
    fn parse_from_import(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        self.expect(TokenKind::From, "'from'")?;
        if self.at(TokenKind::Dot) || self.at(TokenKind::Ellipsis) || ctx == Context::Class {
            self.skip_line();
            return Ok(());
        }
        let source = self.parse_dotted_name()?;
        self.expect(TokenKind::Import, "'import'")?;
        if source == "__future__" || self.at(TokenKind::Star) {
            self.skip_line();
            return Ok(());
        }
        let parenthesized = self.eat(TokenKind::LeftParen);
        loop {
            if parenthesized && self.at(TokenKind::RightParen) {
                break;
            }
            let name = self.expect_name()?;
            let local = if self.eat(TokenKind::As) {
                self.expect_name()?
            } else {
                name.clone()
            };
            let special =
                TYPING_MODULES.contains(&source.as_str()) && TYPING_SPECIAL_FORMS.contains(&name.as_str());
            if !special {
                body.aliases.push(Alias::new(
                    self.qualify(&local),
                    Type::named(format!("{source}.{name}")),
                ));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if parenthesized {
            self.expect(TokenKind::RightParen, "')'")?;
        }
        self.expect_newline()
    }

    fn parse_assignment(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        let line = self.line();
        let name = self.expect_name()?;
        let qualified = match ctx {
            Context::Module => self.qualify(&name),
            Context::Class => name.clone(),
        };
        if self.eat(TokenKind::Colon) {
            let ty = self.parse_type()?;
            if self.eat(TokenKind::Equals) {
                self.skip_default();
            }
            body.constants.push(Constant::new(qualified, ty));
            return self.expect_newline();
        }
        if !self.eat(TokenKind::Equals) {
            return Err(self.expected("':' or '='"));
        }
        if self.at_type_var_call() {
            if ctx == Context::Class {
                return Err(ParseError::new(line, "type variables must be declared at module level"));
            }
            while !self.at(TokenKind::LeftParen) && !self.at_eof() {
                self.advance();
            }
            self.skip_group();
            body.type_params.push(TypeParameter::new(name));
            return self.expect_newline();
        }
        match ctx {
            Context::Module if !self.at(TokenKind::Ellipsis) => {
                let ty = self.parse_type()?;
                body.aliases.push(Alias::new(qualified, ty));
                self.expect_newline()
            }
            _ => {
                // `x = ...` and class-level assignments declare untyped attributes
                body.constants.push(Constant::new(qualified, Type::Anything));
                self.skip_line();
                Ok(())
            }
        }
    }

    fn at_type_var_call(&self) -> bool {
        let text_at = |offset: usize| {
            self.tokens
                .get(self.pos + offset)
                .map_or("", |t| t.text.as_str())
        };
        match (self.peek_kind(0), self.peek_kind(1)) {
            (TokenKind::Name, TokenKind::LeftParen) => text_at(0) == "TypeVar",
            (TokenKind::Name, TokenKind::Dot) => {
                TYPING_MODULES.contains(&text_at(0))
                    && text_at(2) == "TypeVar"
                    && self.peek_kind(3) == TokenKind::LeftParen
            }
            _ => false,
        }
    }

    fn parse_decorated(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        let mut kind = MethodKind::Method;
        while self.eat(TokenKind::At) {
            let name = self.parse_dotted_name()?;
            if self.at(TokenKind::LeftParen) {
                self.skip_group();
            }
            self.expect_newline()?;
            match name.rsplit('.').next().unwrap_or(name.as_str()) {
                "staticmethod" => kind = MethodKind::StaticMethod,
                "classmethod" => kind = MethodKind::ClassMethod,
                _ => {}
            }
        }
        if !self.at(TokenKind::Def) {
            return Err(self.expected("'def' after decorators"));
        }
        self.parse_def(body, ctx, kind)
    }

    fn parse_def(&mut self, body: &mut Body, ctx: Context, kind: MethodKind) -> Result<(), ParseError> {
        self.expect(TokenKind::Def, "'def'")?;
        let name = self.expect_name()?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let params = self.parse_parameters()?;
        self.expect(TokenKind::RightParen, "')'")?;
        let return_type = if self.eat(TokenKind::Arrow) {
            self.parse_type()?
        } else {
            Type::Anything
        };
        self.expect(TokenKind::Colon, "':'")?;
        self.skip_suite()?;
        let name = match ctx {
            Context::Module => self.qualify(&name),
            Context::Class => name,
        };
        body.add_signature(name, kind, Signature::new(params, return_type));
        Ok(())
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, ParseError> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let bare_star = self.at(TokenKind::Star)
                && matches!(self.peek_kind(1), TokenKind::Comma | TokenKind::RightParen);
            if bare_star || self.at(TokenKind::Slash) {
                self.advance();
            } else {
                let kind = if self.eat(TokenKind::Star) {
                    ParamKind::VarArgs
                } else if self.eat(TokenKind::DoubleStar) {
                    ParamKind::KwArgs
                } else {
                    ParamKind::Normal
                };
                let name = self.expect_name()?;
                let ty = if self.eat(TokenKind::Colon) {
                    self.parse_type()?
                } else {
                    Type::Anything
                };
                let optional = self.eat(TokenKind::Equals);
                if optional {
                    self.skip_default();
                }
                params.push(Parameter {
                    name,
                    ty,
                    kind,
                    optional,
                });
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// Skips a function body: either `...` on the same line or an indented
    /// block.
    fn skip_suite(&mut self) -> Result<(), ParseError> {
        if !self.eat(TokenKind::Newline) {
            self.skip_line();
            return Ok(());
        }
        self.expect(TokenKind::Indent, "indented block")?;
        let mut depth = 1u32;
        while depth > 0 {
            match self.current() {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                TokenKind::Eof => return Err(self.error("unexpected end of input in block")),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    fn parse_class(&mut self, body: &mut Body) -> Result<(), ParseError> {
        self.expect(TokenKind::Class, "'class'")?;
        let name = self.expect_name()?;
        let mut parents = Vec::new();
        if self.eat(TokenKind::LeftParen) {
            while !self.at(TokenKind::RightParen) {
                if self.at(TokenKind::Name) && self.peek_kind(1) == TokenKind::Equals {
                    // keyword arguments such as `metaclass=...`
                    self.advance();
                    self.advance();
                    self.skip_default();
                } else {
                    parents.push(self.parse_type()?);
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "')'")?;
        }
        self.expect(TokenKind::Colon, "':'")?;
        let mut members = Body::default();
        self.parse_block(&mut members, Context::Class)?;
        body.classes.push(members.into_class(self.qualify(&name), parents));
        Ok(())
    }

    /// Parses the block after a `:`, either indented or on the same line.
    fn parse_block(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        if !self.eat(TokenKind::Newline) {
            return self.parse_statement(body, ctx);
        }
        self.expect(TokenKind::Indent, "indented block")?;
        while !self.at(TokenKind::Dedent) && !self.at_eof() {
            self.parse_statement(body, ctx)?;
        }
        self.expect(TokenKind::Dedent, "end of block")
    }

    // ========================================================================
    // Version conditionals
    // ========================================================================

    fn parse_conditional(&mut self, body: &mut Body, ctx: Context) -> Result<(), ParseError> {
        self.expect(TokenKind::If, "'if'")?;
        let mut taken = self.parse_condition()?;
        self.expect(TokenKind::Colon, "':'")?;
        self.parse_branch(body, ctx, taken)?;
        loop {
            if self.eat(TokenKind::Elif) {
                let holds = self.parse_condition()?;
                self.expect(TokenKind::Colon, "':'")?;
                self.parse_branch(body, ctx, !taken && holds)?;
                taken |= holds;
            } else if self.eat(TokenKind::Else) {
                self.expect(TokenKind::Colon, "':'")?;
                return self.parse_branch(body, ctx, !taken);
            } else {
                return Ok(());
            }
        }
    }

    fn parse_branch(&mut self, body: &mut Body, ctx: Context, keep: bool) -> Result<(), ParseError> {
        if keep {
            self.parse_block(body, ctx)
        } else {
            self.parse_block(&mut Body::default(), ctx)
        }
    }

    /// Parses `sys.version_info <op> (major, minor)` and evaluates it.
    fn parse_condition(&mut self) -> Result<bool, ParseError> {
        let subject = self.parse_dotted_name()?;
        if subject != "sys.version_info" {
            return Err(self.error(format!("unsupported condition on '{subject}'")));
        }
        let op = self.current();
        if !op.is_comparison() {
            return Err(self.expected("comparison operator"));
        }
        self.advance();
        self.expect(TokenKind::LeftParen, "'('")?;
        let major = self.expect_version_part()?;
        let mut minor = 0;
        if self.eat(TokenKind::Comma) && self.at(TokenKind::Number) {
            minor = self.expect_version_part()?;
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RightParen, "')'")?;
        let bound = PythonVersion::new(major, minor);
        let version = self.version;
        Ok(match op {
            TokenKind::EqualEqual => version == bound,
            TokenKind::NotEqual => version != bound,
            TokenKind::Less => version < bound,
            TokenKind::LessEqual => version <= bound,
            TokenKind::Greater => version > bound,
            _ => version >= bound,
        })
    }

    fn expect_version_part(&mut self) -> Result<u8, ParseError> {
        if !self.at(TokenKind::Number) {
            return Err(self.expected("version number"));
        }
        let part = self
            .current_text()
            .parse()
            .map_err(|_| self.error(format!("version number out of range: {}", self.current_text())))?;
        self.advance();
        Ok(part)
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_name()?;
        while self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Name {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    /// Parses a type expression: alternatives separated by `|`.
    pub fn parse_type(&mut self) -> Result<Type, ParseError> {
        let first = self.parse_primary_type()?;
        if !self.at(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.eat(TokenKind::Pipe) {
            alternatives.push(self.parse_primary_type()?);
        }
        Ok(Type::union(alternatives))
    }

    fn parse_primary_type(&mut self) -> Result<Type, ParseError> {
        match self.current() {
            TokenKind::Ellipsis => {
                self.advance();
                Ok(Type::Anything)
            }
            TokenKind::LeftParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(ty)
            }
            TokenKind::Name => {
                let name = self.parse_dotted_name()?;
                let arguments = if self.eat(TokenKind::LeftBracket) {
                    let mut args = Vec::new();
                    while !self.at(TokenKind::RightBracket) {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RightBracket, "']'")?;
                    Some(args)
                } else {
                    None
                };
                self.named_type(name, arguments)
            }
            _ => Err(self.expected("type")),
        }
    }

    fn named_type(&self, name: String, arguments: Option<Vec<Type>>) -> Result<Type, ParseError> {
        let special = match name.split_once('.') {
            Some((module, rest)) if TYPING_MODULES.contains(&module) => rest,
            Some(_) => "",
            None => name.as_str(),
        }
        .to_string();
        let ty = match (special.as_str(), arguments) {
            ("Any", None) => Type::Anything,
            ("NoReturn" | "Never", None) => Type::Nothing,
            ("None", None) => Type::named(NONE_TYPE),
            ("Optional", Some(mut args)) if args.len() == 1 => {
                Type::union([args.remove(0), Type::named(NONE_TYPE)])
            }
            ("Optional", Some(_)) => {
                return Err(self.error("Optional takes exactly one argument"));
            }
            ("Union", Some(args)) => Type::union(args),
            (_, Some(args)) => Type::generic(Type::named(name), args),
            (_, None) => Type::named(name),
        };
        Ok(ty)
    }
}
