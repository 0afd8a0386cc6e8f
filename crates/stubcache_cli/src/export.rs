//! `stubcache export`: print a stub file in normalized export form.

use std::error::Error;

use stubcache_cache::{prepare_for_export_with, Loader};

use crate::context::{self, Context};
use crate::{ExportArgs, GlobalArgs};

/// Runs the `stubcache export` command.
pub fn run(args: &ExportArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let ctx = Context::from_global(global)?;
    let module = context::module_name(&args.file, args.module.as_deref())?;
    let source = context::read_source(&args.file)?;
    print!("{}", export_source(&ctx, &module, &source)?);
    Ok(0)
}

/// Parses `source` as `module` and renders its export form.
pub fn export_source(ctx: &Context, module: &str, source: &str) -> Result<String, Box<dyn Error>> {
    let tree = ctx.loader.parse(source, module, ctx.version)?;
    let exported = prepare_for_export_with(
        module,
        ctx.version,
        &tree,
        &ctx.loader,
        &ctx.config.export.protected[..],
    )?;
    Ok(ctx.loader.print(&exported))
}
