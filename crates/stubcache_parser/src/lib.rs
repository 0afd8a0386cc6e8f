//! Parser and printer for declaration stubs.
//!
//! Stubs are a line- and indentation-based subset of Python stub syntax:
//! module-level constants, aliases and type variables, classes with
//! attributes and methods, overloaded functions, and
//! `sys.version_info` conditionals evaluated against a [`PythonVersion`].
//! [`parse_source`] produces a [`Unit`] whose names are qualified with the
//! module name; [`print_unit`] turns a tree back into source that parses to
//! an equivalent tree.

#![warn(missing_docs)]

pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use error::ParseError;
pub use parser::{StubParser, NONE_TYPE};
pub use printer::print_unit;

use stubcache_ast::Unit;
use stubcache_common::PythonVersion;

/// Parses the stub `source` of `module`.
pub fn parse_source(source: &str, module: &str, version: PythonVersion) -> Result<Unit, ParseError> {
    let tokens = lexer::lex(source)?;
    StubParser::new(tokens, module, version).parse_unit()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
import sys
from typing import Generic, overload

T = TypeVar('T')

class Box(Generic[T]):
    value: T
    def get(self) -> T: ...
    @overload
    def put(self, item: T) -> None: ...
    @overload
    def put(self, item: T, *more: T) -> None: ...

if sys.version_info >= (3, 10):
    def fresh(x: float = ...) -> Box[int]: ...
else:
    def fresh() -> Box[int]: ...

Alias = dict[str, Box[int] | None]
";

    #[test]
    fn print_then_parse_is_stable() {
        let version = PythonVersion::new(3, 11);
        let first = parse_source(SAMPLE, "pkg.mod", version).unwrap();
        let printed = print_unit(&first);
        let second = parse_source(&printed, "pkg.mod", version).unwrap();
        assert_eq!(first, second);
        assert_eq!(print_unit(&second), printed);
    }

    #[test]
    fn version_selects_branch() {
        let old = parse_source(SAMPLE, "pkg.mod", PythonVersion::new(3, 8)).unwrap();
        assert!(old.functions[0].signatures[0].params.is_empty());
        let new = parse_source(SAMPLE, "pkg.mod", PythonVersion::new(3, 12)).unwrap();
        assert_eq!(new.functions[0].signatures[0].params.len(), 1);
    }

    #[test]
    fn lexer_errors_surface_as_parse_errors() {
        let err = parse_source("x: int\n  y: int\n", "m", PythonVersion::default());
        assert!(err.is_err());
    }
}
