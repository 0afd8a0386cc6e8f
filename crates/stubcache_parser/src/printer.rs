//! Printing declaration trees back to stub source.
//!
//! The output parses back to an equivalent tree: names qualified with the
//! module's own name or with `builtins` are printed bare, lazy references are
//! printed verbatim and functions with several signatures are printed as
//! `@overload` groups.

use std::fmt::Write;

use stubcache_ast::{Class, Function, MethodKind, ParamKind, Parameter, Type, Unit};

use crate::parser::NONE_TYPE;

const INDENT: &str = "    ";

/// Prints `unit` as stub source.
pub fn print_unit(unit: &Unit) -> String {
    Printer { module: &unit.name }.unit(unit)
}

struct Printer<'a> {
    module: &'a str,
}

fn strip_module<'n>(name: &'n str, module: &str) -> Option<&'n str> {
    name.strip_prefix(module)?
        .strip_prefix('.')
        .filter(|rest| !rest.contains('.'))
}

impl Printer<'_> {
    fn unit(&self, unit: &Unit) -> String {
        let mut blocks: Vec<String> = Vec::new();

        let mut header = String::new();
        for param in &unit.type_params {
            let _ = writeln!(header, "{0} = TypeVar('{0}')", param.name);
        }
        for constant in &unit.constants {
            let _ = writeln!(
                header,
                "{}: {}",
                self.decl_name(&constant.name),
                self.ty(&constant.ty)
            );
        }
        for alias in &unit.aliases {
            let _ = writeln!(
                header,
                "{} = {}",
                self.decl_name(&alias.name),
                self.ty(&alias.ty)
            );
        }
        if !header.is_empty() {
            blocks.push(header);
        }

        for class in &unit.classes {
            blocks.push(self.class(class));
        }

        let mut functions = String::new();
        for function in &unit.functions {
            self.function(&mut functions, function, "");
        }
        if !functions.is_empty() {
            blocks.push(functions);
        }

        blocks.join("\n")
    }

    fn decl_name<'n>(&self, name: &'n str) -> &'n str {
        strip_module(name, self.module).unwrap_or(name)
    }

    fn ref_name<'n>(&self, name: &'n str) -> &'n str {
        if name == NONE_TYPE {
            return "None";
        }
        strip_module(name, self.module)
            .or_else(|| strip_module(name, "builtins"))
            .unwrap_or(name)
    }

    fn class(&self, class: &Class) -> String {
        let mut out = format!("class {}", self.decl_name(&class.name));
        if !class.parents.is_empty() {
            let parents: Vec<String> = class.parents.iter().map(|p| self.ty(p)).collect();
            let _ = write!(out, "({})", parents.join(", "));
        }
        if class.constants.is_empty() && class.methods.is_empty() {
            out.push_str(": ...\n");
            return out;
        }
        out.push_str(":\n");
        for constant in &class.constants {
            let _ = writeln!(out, "{INDENT}{}: {}", constant.name, self.ty(&constant.ty));
        }
        for method in &class.methods {
            self.function(&mut out, method, INDENT);
        }
        out
    }

    fn function(&self, out: &mut String, function: &Function, indent: &str) {
        let name = self.decl_name(&function.name);
        for signature in &function.signatures {
            if function.signatures.len() > 1 {
                let _ = writeln!(out, "{indent}@overload");
            }
            match function.kind {
                MethodKind::StaticMethod => {
                    let _ = writeln!(out, "{indent}@staticmethod");
                }
                MethodKind::ClassMethod => {
                    let _ = writeln!(out, "{indent}@classmethod");
                }
                MethodKind::Method => {}
            }
            let params: Vec<String> = signature.params.iter().map(|p| self.param(p)).collect();
            let _ = writeln!(
                out,
                "{indent}def {name}({}) -> {}: ...",
                params.join(", "),
                self.ty(&signature.return_type)
            );
        }
    }

    fn param(&self, param: &Parameter) -> String {
        let mut out = match param.kind {
            ParamKind::Normal => String::new(),
            ParamKind::VarArgs => "*".to_string(),
            ParamKind::KwArgs => "**".to_string(),
        };
        out.push_str(&param.name);
        if param.ty != Type::Anything {
            let _ = write!(out, ": {}", self.ty(&param.ty));
        }
        if param.optional {
            out.push_str(" = ...");
        }
        out
    }

    fn ty(&self, ty: &Type) -> String {
        match ty {
            Type::Anything => "Any".to_string(),
            Type::Nothing => "NoReturn".to_string(),
            Type::Named(n) => self.ref_name(&n.name).to_string(),
            Type::Class(c) => self.ref_name(&c.name).to_string(),
            Type::Late(l) => l.name.clone(),
            Type::Param(p) => p.name.clone(),
            Type::Generic(g) => {
                let args: Vec<String> = g.parameters.iter().map(|p| self.ty(p)).collect();
                format!("{}[{}]", self.ty(&g.base), args.join(", "))
            }
            Type::Union(u) => {
                let alternatives: Vec<String> = u.types.iter().map(|t| self.ty(t)).collect();
                alternatives.join(" | ")
            }
        }
    }
}
