//! `stubcache load`: resolve a module and its dependencies from the cache
//! directory.
//!
//! Dependencies are loaded depth first, so each bundle is resolved against a
//! module map that already holds everything it refers to. The map starts with
//! the builtin and typing tables.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use stubcache_ast::{ModuleMap, Unit};
use stubcache_cache::{ensure_ast_name, load_bundle, resolve};

use crate::context::{self, Context};
use crate::{GlobalArgs, LoadArgs};

/// Runs the `stubcache load` command.
pub fn run(args: &LoadArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let ctx = Context::from_global(global)?;
    let mut session = LoadSession::new(&ctx.config.cache.dir, ctx.loader.prelude());
    let name = args.as_name.as_deref().unwrap_or(&args.module);
    let tree = session.load(&args.module, name)?;
    if !global.quiet {
        eprintln!("     Loaded {name} ({} modules)", session.modules.len());
    }
    print!("{}", stubcache_parser::print_unit(&tree));
    Ok(0)
}

/// A module map being filled from one cache directory.
pub struct LoadSession<'a> {
    dir: &'a Path,
    /// Modules resolved so far.
    pub modules: ModuleMap,
    visiting: Vec<String>,
}

impl<'a> LoadSession<'a> {
    /// Starts a session over `dir`, seeded with `modules`.
    pub fn new(dir: &'a Path, modules: ModuleMap) -> Self {
        Self {
            dir,
            modules,
            visiting: Vec::new(),
        }
    }

    /// Loads the bundle stored for `module` under `name`, loading its
    /// dependencies first.
    pub fn load(&mut self, module: &str, name: &str) -> Result<Arc<Unit>, Box<dyn Error>> {
        if let Some(unit) = self.modules.get(name) {
            return Ok(Arc::clone(unit));
        }
        if self.visiting.iter().any(|m| m == name) {
            let mut chain = self.visiting.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(name);
            return Err(format!("circular dependency: {chain}").into());
        }
        self.visiting.push(name.to_string());
        let loaded = self.load_unvisited(module, name);
        self.visiting.pop();

        let tree = loaded?;
        self.modules.insert(name.to_string(), Arc::clone(&tree));
        tracing::info!(module = %name, "module loaded");
        Ok(tree)
    }

    fn load_unvisited(&mut self, module: &str, name: &str) -> Result<Arc<Unit>, Box<dyn Error>> {
        let bundle = load_bundle(&context::bundle_path(self.dir, module))?;
        for dep in &bundle.dependencies {
            if dep != bundle.name() && dep != name {
                self.load(dep, dep)?;
            }
        }
        let bundle = ensure_ast_name(bundle, name)?;
        Ok(Arc::new(resolve(bundle, &self.modules)?))
    }
}
