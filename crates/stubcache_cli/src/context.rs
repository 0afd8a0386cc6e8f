//! Shared setup for the commands: configuration, language version and the
//! source loader.

use std::error::Error;
use std::path::{Path, PathBuf};

use stubcache_cache::SourceLoader;
use stubcache_common::PythonVersion;
use stubcache_config::StubcacheConfig;

use crate::GlobalArgs;

/// File extension of bundle files in the cache directory.
pub const BUNDLE_EXTENSION: &str = "stc";

/// Everything a command needs besides its own arguments.
pub struct Context {
    /// The loaded configuration.
    pub config: StubcacheConfig,
    /// Version that stub conditionals are evaluated against.
    pub version: PythonVersion,
    /// Loader with the builtin tables.
    pub loader: SourceLoader,
}

impl Context {
    /// Loads the configuration named by `--config`, or `stubcache.toml` in
    /// the working directory, and builds the loader it describes.
    pub fn from_global(global: &GlobalArgs) -> Result<Self, Box<dyn Error>> {
        let config = match &global.config {
            Some(path) => stubcache_config::load_config(Path::new(path))?,
            None => stubcache_config::find_config(&std::env::current_dir()?)?,
        };
        Self::from_config(config)
    }

    /// Builds the loader described by `config`.
    pub fn from_config(config: StubcacheConfig) -> Result<Self, Box<dyn Error>> {
        let version = config.python.parsed_version()?;
        let loader = match &config.builtins.path {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read builtins {}: {e}", path.display()))?;
                SourceLoader::from_builtins_source(&source, version)?
            }
            None => SourceLoader::new(version)?,
        };
        tracing::debug!(%version, cache = %config.cache.dir.display(), "configured");
        Ok(Self {
            config,
            version,
            loader,
        })
    }

    /// Path of the bundle for `module` in the cache directory.
    pub fn bundle_path(&self, module: &str) -> PathBuf {
        bundle_path(&self.config.cache.dir, module)
    }
}

/// Path of the bundle for `module` in `dir`.
pub fn bundle_path(dir: &Path, module: &str) -> PathBuf {
    dir.join(format!("{module}.{BUNDLE_EXTENSION}"))
}

/// Module name given on the command line, or the file stem of `file`.
pub fn module_name(file: &str, explicit: Option<&str>) -> Result<String, Box<dyn Error>> {
    if let Some(name) = explicit {
        return Ok(name.to_string());
    }
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a module name from '{file}'").into())
}

/// Reads a stub file.
pub fn read_source(file: &str) -> Result<String, Box<dyn Error>> {
    std::fs::read_to_string(file).map_err(|e| format!("cannot read {file}: {e}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_defaults_to_stem() {
        assert_eq!(module_name("stubs/os.pyi", None).unwrap(), "os");
        assert_eq!(module_name("os.pyi", Some("pkg.os")).unwrap(), "pkg.os");
    }

    #[test]
    fn bundle_paths_use_module_name() {
        let path = bundle_path(Path::new("cache"), "pkg.mod");
        assert_eq!(path, PathBuf::from("cache/pkg.mod.stc"));
    }

    #[test]
    fn default_config_builds_loader() {
        let ctx = Context::from_config(StubcacheConfig::default()).unwrap();
        assert_eq!(ctx.version, PythonVersion::default());
        assert!(ctx.loader.prelude().contains_key("builtins"));
    }

    #[test]
    fn missing_builtins_file_is_reported() {
        let mut config = StubcacheConfig::default();
        config.builtins.path = Some(PathBuf::from("/nonexistent/builtins.pyi"));
        let err = Context::from_config(config).err().unwrap();
        assert!(err.to_string().contains("cannot read builtins"));
    }
}
