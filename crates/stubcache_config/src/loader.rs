//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::StubcacheConfig;
use std::path::Path;

/// Name of the configuration file looked up by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "stubcache.toml";

/// Loads and validates the configuration file at `path`.
///
/// Relative paths inside the file are taken relative to the file's
/// directory.
pub fn load_config(path: &Path) -> Result<StubcacheConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let Some(base) = path.parent() {
        anchor_paths(&mut config, base);
    }
    Ok(config)
}

/// Loads `<dir>/stubcache.toml` if it exists, or returns the defaults.
pub fn find_config(dir: &Path) -> Result<StubcacheConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config(&path)
    } else {
        Ok(StubcacheConfig::default())
    }
}

/// Parses and validates a `stubcache.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<StubcacheConfig, ConfigError> {
    let config: StubcacheConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configured values are usable.
fn validate_config(config: &StubcacheConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("cache.dir".to_string()));
    }
    config
        .python
        .parsed_version()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    if let Some(ns) = config
        .export
        .protected
        .iter()
        .find(|ns| ns.is_empty() || ns.ends_with('.'))
    {
        return Err(ConfigError::ValidationError(format!(
            "invalid protected namespace '{ns}'"
        )));
    }
    Ok(())
}

fn anchor_paths(config: &mut StubcacheConfig, base: &Path) {
    if config.cache.dir.is_relative() {
        config.cache.dir = base.join(&config.cache.dir);
    }
    if let Some(path) = config.builtins.path.as_mut().filter(|p| p.is_relative()) {
        *path = base.join(&*path);
    }
}
