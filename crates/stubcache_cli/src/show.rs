//! `stubcache show`: print the contents of a bundle.

use std::error::Error;
use std::path::Path;

use stubcache_cache::{load_bundle, CacheBundle};

use crate::{GlobalArgs, ShowArgs};

/// Runs the `stubcache show` command.
pub fn run(args: &ShowArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let bundle = load_bundle(Path::new(&args.bundle))?;
    print!("{}", describe(&bundle));
    Ok(0)
}

/// Renders the bundle summary followed by the tree as stub source.
fn describe(bundle: &CacheBundle) -> String {
    let index = match &bundle.reference_index {
        Some(index) => index.len().to_string(),
        None => "none".to_string(),
    };
    let mut out = format!(
        "module: {}\ndependencies: {}\nreferences indexed: {index}\n",
        bundle.name(),
        bundle.dependencies.join(", ")
    );
    let source = stubcache_parser::print_unit(&bundle.tree);
    if !source.is_empty() {
        out.push('\n');
        out.push_str(&source);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_ast::{Constant, Type, Unit};
    use stubcache_cache::prepare_bundle;

    #[test]
    fn describes_bundle() {
        let tree = Unit::new("m").with_constant(Constant::new("m.x", Type::class("other.A")));
        let text = describe(&prepare_bundle(&tree).unwrap());
        assert!(text.starts_with("module: m\ndependencies: m, other\nreferences indexed: 1\n"));
        assert!(text.contains("x: other.A"));
    }

    #[test]
    fn empty_bundle_has_no_body() {
        let text = describe(&prepare_bundle(&Unit::new("m")).unwrap());
        assert_eq!(text, "module: m\ndependencies: \nreferences indexed: 0\n");
    }
}
