//! stubcache CLI: store, inspect, load and export cached declaration trees.
//!
//! Provides `stubcache store` to turn a stub file into a cache bundle,
//! `stubcache show` to inspect a bundle, `stubcache load` to resolve a module
//! and its dependencies from the cache directory, and `stubcache export` to
//! print a stub in its normalized export form.

#![warn(missing_docs)]

mod context;
mod export;
mod load;
mod show;
mod store;

use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// A cache for module interface declarations.
#[derive(Parser, Debug)]
#[command(name = "stubcache", version, about = "Declaration stub cache")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and command results.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a custom `stubcache.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a stub file and store it as a cache bundle.
    Store(StoreArgs),
    /// Print the contents of a cache bundle.
    Show(ShowArgs),
    /// Load a module and its dependencies from the cache directory.
    Load(LoadArgs),
    /// Print a stub file in normalized export form.
    Export(ExportArgs),
}

/// Arguments for the `stubcache store` subcommand.
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// Stub file to load.
    pub file: String,

    /// Module name (default: the file stem).
    #[arg(short, long)]
    pub module: Option<String>,

    /// Bundle path (default: `<cache.dir>/<module>.stc`).
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `stubcache show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Bundle file to inspect.
    pub bundle: String,
}

/// Arguments for the `stubcache load` subcommand.
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Module whose bundle is loaded from the cache directory.
    pub module: String,

    /// Name to load the module under (default: its stored name).
    #[arg(long = "as", value_name = "NAME")]
    pub as_name: Option<String>,
}

/// Arguments for the `stubcache export` subcommand.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Stub file to export.
    pub file: String,

    /// Module name (default: the file stem).
    #[arg(short, long)]
    pub module: Option<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-result output.
    pub quiet: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

/// Installs the stderr log subscriber for the requested verbosity.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Store(ref args) => store::run(args, &global),
        Command::Show(ref args) => show::run(args, &global),
        Command::Load(ref args) => load::run(args, &global),
        Command::Export(ref args) => export::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_store_default() {
        let cli = Cli::parse_from(["stubcache", "store", "stubs/mod.pyi"]);
        match cli.command {
            Command::Store(ref args) => {
                assert_eq!(args.file, "stubs/mod.pyi");
                assert!(args.module.is_none());
                assert!(args.output.is_none());
            }
            _ => panic!("expected Store command"),
        }
    }

    #[test]
    fn parse_store_with_args() {
        let cli = Cli::parse_from([
            "stubcache",
            "store",
            "mod.pyi",
            "--module",
            "pkg.mod",
            "--output",
            "out/pkg.mod.stc",
        ]);
        match cli.command {
            Command::Store(ref args) => {
                assert_eq!(args.module.as_deref(), Some("pkg.mod"));
                assert_eq!(args.output.as_deref(), Some("out/pkg.mod.stc"));
            }
            _ => panic!("expected Store command"),
        }
    }

    #[test]
    fn parse_load_as() {
        let cli = Cli::parse_from(["stubcache", "load", "pkg.mod", "--as", "alias.mod"]);
        match cli.command {
            Command::Load(ref args) => {
                assert_eq!(args.module, "pkg.mod");
                assert_eq!(args.as_name.as_deref(), Some("alias.mod"));
            }
            _ => panic!("expected Load command"),
        }
    }

    #[test]
    fn parse_show_and_export() {
        let cli = Cli::parse_from(["stubcache", "show", "m.stc"]);
        assert!(matches!(cli.command, Command::Show(ref args) if args.bundle == "m.stc"));
        let cli = Cli::parse_from(["stubcache", "export", "m.pyi", "-m", "pkg.m"]);
        assert!(matches!(
            cli.command,
            Command::Export(ref args) if args.module.as_deref() == Some("pkg.m")
        ));
    }

    #[test]
    fn parse_verbosity_count() {
        let cli = Cli::parse_from(["stubcache", "-vv", "show", "m.stc"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn parse_global_flags_after_command() {
        let cli = Cli::parse_from([
            "stubcache",
            "show",
            "m.stc",
            "--quiet",
            "--config",
            "/path/to/stubcache.toml",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.config.as_deref(), Some("/path/to/stubcache.toml"));
    }
}
