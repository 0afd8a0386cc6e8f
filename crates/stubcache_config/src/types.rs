//! Configuration types deserialized from `stubcache.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use stubcache_common::{ParseVersionError, PythonVersion};

/// The top-level configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct StubcacheConfig {
    /// Where bundles are stored.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Language version settings.
    #[serde(default)]
    pub python: PythonConfig,
    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,
    /// Builtin table settings.
    #[serde(default)]
    pub builtins: BuiltinsConfig,
}

/// Bundle storage settings.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one `<module>.stc` file per stored module.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".stubcache")
}

/// Language version settings.
#[derive(Debug, Deserialize)]
pub struct PythonConfig {
    /// `major.minor` version that `sys.version_info` checks are evaluated
    /// against.
    #[serde(default = "default_version")]
    pub version: String,
}

impl PythonConfig {
    /// Parses the configured version.
    pub fn parsed_version(&self) -> Result<PythonVersion, ParseVersionError> {
        self.version.parse()
    }
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

fn default_version() -> String {
    PythonVersion::default().to_string()
}

/// Export settings.
#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    /// Namespaces whose class references stay resolved in exported trees.
    ///
    /// Accepts a single string or a list of strings.
    #[serde(default = "default_protected", deserialize_with = "deserialize_string_or_vec")]
    pub protected: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            protected: default_protected(),
        }
    }
}

fn default_protected() -> Vec<String> {
    vec!["builtins".to_string(), "typing".to_string()]
}

/// Builtin table settings.
#[derive(Debug, Default, Deserialize)]
pub struct BuiltinsConfig {
    /// A stub file replacing the bundled builtin table.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Deserializes a field that can be either a single string or a list of strings.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn protected_accepts_single_string() {
        let config = load_config_from_str("[export]\nprotected = \"builtins\"\n").unwrap();
        assert_eq!(config.export.protected, vec!["builtins"]);
    }

    #[test]
    fn protected_accepts_list() {
        let config =
            load_config_from_str("[export]\nprotected = [\"builtins\", \"collections\"]\n").unwrap();
        assert_eq!(config.export.protected, vec!["builtins", "collections"]);
    }

    #[test]
    fn empty_export_section_keeps_default_namespaces() {
        let config = load_config_from_str("[export]\n").unwrap();
        assert_eq!(config.export.protected, vec!["builtins", "typing"]);
    }

    #[test]
    fn version_parses() {
        let config = load_config_from_str("[python]\nversion = \"3.8\"\n").unwrap();
        assert_eq!(config.python.parsed_version().unwrap(), PythonVersion::new(3, 8));
    }
}
