//! `stubcache store`: load a stub file and write its bundle.

use std::error::Error;
use std::path::PathBuf;

use stubcache_cache::{load_source, store_ast};

use crate::context::{self, Context};
use crate::{GlobalArgs, StoreArgs};

/// Runs the `stubcache store` command.
pub fn run(args: &StoreArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let ctx = Context::from_global(global)?;
    let module = context::module_name(&args.file, args.module.as_deref())?;
    let path = store_file(&ctx, &args.file, &module, args.output.as_deref().map(PathBuf::from))?;
    if !global.quiet {
        eprintln!("     Stored {module} -> {}", path.display());
    }
    Ok(0)
}

/// Loads `file` as `module` and stores its bundle at `output`, or at the
/// module's path in the cache directory.
pub fn store_file(
    ctx: &Context,
    file: &str,
    module: &str,
    output: Option<PathBuf>,
) -> Result<PathBuf, Box<dyn Error>> {
    let source = context::read_source(file)?;
    let tree = load_source(module, ctx.version, &source, &ctx.loader)?;
    // package initializers are stored under the package name
    let stored_name = module.strip_suffix(".__init__").unwrap_or(module);
    let path = output.unwrap_or_else(|| ctx.bundle_path(stored_name));
    store_ast(&tree, Some(&path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_cache::load_bundle;
    use stubcache_config::StubcacheConfig;

    fn context(dir: &std::path::Path) -> Context {
        let mut config = StubcacheConfig::default();
        config.cache.dir = dir.join("cache");
        Context::from_config(config).unwrap()
    }

    #[test]
    fn stores_into_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("shapes.pyi");
        std::fs::write(&file, "class Shape:\n    def area(self) -> float: ...\n").unwrap();
        let ctx = context(dir.path());

        let path = store_file(&ctx, file.to_str().unwrap(), "shapes", None).unwrap();
        assert_eq!(path, dir.path().join("cache").join("shapes.stc"));
        let bundle = load_bundle(&path).unwrap();
        assert_eq!(bundle.name(), "shapes");
        assert_eq!(bundle.dependencies, ["builtins", "shapes"]);
    }

    #[test]
    fn package_init_uses_package_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("__init__.pyi");
        std::fs::write(&file, "x: int\n").unwrap();
        let ctx = context(dir.path());

        let path = store_file(&ctx, file.to_str().unwrap(), "pkg.__init__", None).unwrap();
        assert_eq!(path, dir.path().join("cache").join("pkg.stc"));
        assert_eq!(load_bundle(&path).unwrap().name(), "pkg");
    }

    #[test]
    fn unreadable_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let err = store_file(&ctx, "/nonexistent/x.pyi", "x", None).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
