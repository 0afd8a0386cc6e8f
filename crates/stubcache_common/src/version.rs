//! Language version tags used to evaluate conditional stub declarations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `major.minor` language version such as `3.11`.
///
/// Ordering is lexicographic on `(major, minor)`, which is what
/// `sys.version_info >= (3, 8)` style checks compare against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PythonVersion {
    /// Major version number.
    pub major: u8,
    /// Minor version number.
    pub minor: u8,
}

impl PythonVersion {
    /// Creates a version from its components.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self::new(3, 11)
    }
}

impl fmt::Debug for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PythonVersion({self})")
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error type for parsing version strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version: '{}'", self.input)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for PythonVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseVersionError {
            input: s.to_string(),
        };
        let (major, minor) = s.split_once('.').ok_or_else(err)?;
        let major: u8 = major.parse().map_err(|_| err())?;
        let minor: u8 = minor.parse().map_err(|_| err())?;
        Ok(PythonVersion::new(major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_major_minor() {
        let v: PythonVersion = "3.8".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 8));
    }

    #[test]
    fn parse_trims_whitespace() {
        let v: PythonVersion = " 3.12 ".parse().unwrap();
        assert_eq!(v.minor, 12);
    }

    #[test]
    fn parse_invalid() {
        assert!("3".parse::<PythonVersion>().is_err());
        assert!("three.eight".parse::<PythonVersion>().is_err());
        assert!("3.8.1".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn ordering_is_by_component() {
        assert!(PythonVersion::new(3, 10) > PythonVersion::new(3, 9));
        assert!(PythonVersion::new(2, 7) < PythonVersion::new(3, 0));
    }

    #[test]
    fn display_and_debug() {
        let v = PythonVersion::new(3, 11);
        assert_eq!(v.to_string(), "3.11");
        assert_eq!(format!("{v:?}"), "PythonVersion(3.11)");
    }
}
