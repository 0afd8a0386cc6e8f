//! Binary encoding of cache bundles.
//!
//! A bundle file is a 4-byte little-endian header length, a bincode-encoded
//! [`BundleHeader`] carrying magic bytes, format version and a checksum of the
//! payload, and the payload itself. The payload stores the tree, the
//! dependency list and the reference index. Index entries are stored as
//! positions in the pre-order sequence of class reference occurrences, so the
//! decoder can hand out handles into the tree it just rebuilt.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stubcache_ast::passes::FindClassTypes;
use stubcache_ast::{ClassType, Unit};

use crate::bundle::CacheBundle;
use crate::error::CacheError;

/// Magic bytes identifying a stubcache bundle.
const BUNDLE_MAGIC: [u8; 4] = *b"STBC";

/// Current bundle format version. Increment on breaking changes to the header
/// or payload format.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Version of the tool writing bundles.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header prepended to every bundle for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleHeader {
    /// Magic bytes: must be `b"STBC"`.
    pub magic: [u8; 4],

    /// Bundle format version.
    pub format_version: u32,

    /// Tool version that produced this bundle.
    pub tool_version: String,

    /// Checksum of the payload (for integrity checks).
    pub checksum: PayloadChecksum,
}

/// XXH3-128 checksum of a bundle payload.
///
/// Truncated or tampered payloads are rejected before bincode sees them.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadChecksum([u8; 16]);

impl PayloadChecksum {
    /// Checksums `payload`.
    pub fn of(payload: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(payload).to_le_bytes())
    }

    fn verify(self, payload: &[u8]) -> Result<(), CacheError> {
        let actual = Self::of(payload);
        if actual == self {
            return Ok(());
        }
        Err(CacheError::ChecksumMismatch {
            expected: self.to_string(),
            actual: actual.to_string(),
        })
    }
}

impl fmt::Display for PayloadChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for PayloadChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadChecksum({self})")
    }
}

#[derive(Serialize, Deserialize)]
struct BundleRecord {
    tree: Unit,
    dependencies: Vec<String>,
    reference_index: Option<Vec<u32>>,
}

fn serialization_error(e: impl std::fmt::Display) -> CacheError {
    CacheError::Serialization {
        reason: e.to_string(),
    }
}

/// Maps index entries to occurrence positions. Returns `None` if an entry is
/// not reachable from the tree, or listed more often than it occurs.
fn index_ordinals(tree: &Unit, index: &[Arc<ClassType>]) -> Option<Vec<u32>> {
    let mut found = FindClassTypes::new();
    tree.visit(&mut found);
    let mut occurrences: HashMap<*const ClassType, Vec<u32>> = HashMap::new();
    for (position, node) in found.nodes.iter().enumerate().rev() {
        let position = u32::try_from(position).ok()?;
        occurrences
            .entry(Arc::as_ptr(node))
            .or_default()
            .push(position);
    }
    index
        .iter()
        .map(|node| occurrences.get_mut(&Arc::as_ptr(node))?.pop())
        .collect()
}

/// Encodes a bundle, header included.
///
/// A stale reference index (one naming nodes the tree no longer contains) is
/// not written; the decoded bundle then has no index.
pub fn encode_bundle(bundle: &CacheBundle) -> Result<Vec<u8>, CacheError> {
    let reference_index = match &bundle.reference_index {
        None => None,
        Some(index) => {
            let ordinals = index_ordinals(&bundle.tree, index);
            if ordinals.is_none() {
                tracing::warn!(
                    module = %bundle.tree.name,
                    "reference index does not match the tree; storing without it"
                );
            }
            ordinals
        }
    };
    let record = BundleRecord {
        tree: bundle.tree.clone(),
        dependencies: bundle.dependencies.clone(),
        reference_index,
    };
    let payload = bincode::serde::encode_to_vec(&record, bincode::config::standard())
        .map_err(serialization_error)?;

    let header = BundleHeader {
        magic: BUNDLE_MAGIC,
        format_version: BUNDLE_FORMAT_VERSION,
        tool_version: TOOL_VERSION.to_string(),
        checksum: PayloadChecksum::of(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(serialization_error)?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = u32::try_from(header_bytes.len()).map_err(serialization_error)?;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes a bundle, validating its header and checksum.
pub fn decode_bundle(bytes: &[u8]) -> Result<CacheBundle, CacheError> {
    let invalid = |reason: &str| CacheError::InvalidHeader {
        reason: reason.to_string(),
    };
    let len_bytes: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("missing header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = bytes
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (BundleHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != BUNDLE_MAGIC {
        return Err(invalid("missing magic bytes"));
    }
    if header.format_version != BUNDLE_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: BUNDLE_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &bytes[4 + header_len..];
    header.checksum.verify(payload)?;

    let (record, _): (BundleRecord, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(serialization_error)?;

    let reference_index = match record.reference_index {
        None => None,
        Some(ordinals) => {
            let mut found = FindClassTypes::new();
            record.tree.visit(&mut found);
            let nodes = ordinals
                .iter()
                .map(|&i| found.nodes.get(i as usize).cloned())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| serialization_error("reference index out of range"))?;
            Some(nodes)
        }
    };

    Ok(CacheBundle::new(
        record.tree,
        record.dependencies,
        reference_index,
    ))
}

/// Encodes `bundle` and writes it to `path`, creating parent directories.
pub fn write_bundle(bundle: &CacheBundle, path: &Path) -> Result<(), CacheError> {
    let bytes = encode_bundle(bundle)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, &bytes).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(module = %bundle.tree.name, path = %path.display(), bytes = bytes.len(), "stored bundle");
    Ok(())
}

/// Reads and decodes the bundle at `path`.
pub fn load_bundle(path: &Path) -> Result<CacheBundle, CacheError> {
    let bytes = std::fs::read(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let bundle = decode_bundle(&bytes)?;
    tracing::info!(module = %bundle.tree.name, path = %path.display(), "loaded bundle");
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubcache_ast::{Class, Constant, Type};

    fn indexed(tree: Unit) -> CacheBundle {
        let mut found = FindClassTypes::new();
        tree.visit(&mut found);
        let deps = vec!["m".to_string(), "other".to_string()];
        CacheBundle::new(tree, deps, Some(found.nodes))
    }

    fn sample() -> Unit {
        let shared = Type::class("other.B");
        Unit::new("m")
            .with_class(Class::new("m.A", vec![Type::class("other.Base")], vec![], vec![]))
            .with_constant(Constant::new("m.x", shared.clone()))
            .with_constant(Constant::new("m.y", shared))
    }

    #[test]
    fn roundtrip_rebuilds_index_handles() {
        let bundle = indexed(sample());
        let bytes = encode_bundle(&bundle).unwrap();
        let decoded = decode_bundle(&bytes).unwrap();
        assert_eq!(decoded.tree, bundle.tree);
        assert_eq!(decoded.dependencies, bundle.dependencies);
        assert_eq!(decoded.reference_index.as_ref().unwrap().len(), 3);
        assert!(decoded.index_is_exact());
    }

    #[test]
    fn stale_index_is_not_written() {
        let mut bundle = indexed(sample());
        bundle
            .reference_index
            .as_mut()
            .unwrap()
            .push(Arc::new(ClassType::new("other.Gone")));
        let decoded = decode_bundle(&encode_bundle(&bundle).unwrap()).unwrap();
        assert!(decoded.reference_index.is_none());
        assert_eq!(decoded.tree, bundle.tree);
    }

    #[test]
    fn missing_index_stays_missing() {
        let bundle = CacheBundle::new(sample(), vec![], None);
        let decoded = decode_bundle(&encode_bundle(&bundle).unwrap()).unwrap();
        assert!(decoded.reference_index.is_none());
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            decode_bundle(b"ab"),
            Err(CacheError::InvalidHeader { .. })
        ));
        assert!(matches!(
            decode_bundle(&[200, 0, 0, 0, 1]),
            Err(CacheError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = encode_bundle(&indexed(sample())).unwrap();
        // the header starts with the magic bytes, right after the length
        bytes[4] = b'X';
        assert!(matches!(
            decode_bundle(&bytes),
            Err(CacheError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let header = BundleHeader {
            magic: BUNDLE_MAGIC,
            format_version: BUNDLE_FORMAT_VERSION + 1,
            tool_version: TOOL_VERSION.to_string(),
            checksum: PayloadChecksum::of(b""),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).unwrap();
        let mut bytes = (header_bytes.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&header_bytes);
        assert!(matches!(
            decode_bundle(&bytes),
            Err(CacheError::VersionMismatch { actual, .. }) if actual == BUNDLE_FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn checksum_prints_as_hex() {
        let checksum = PayloadChecksum::of(b"class A: ...");
        let text = checksum.to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(format!("{checksum:?}"), format!("PayloadChecksum({text})"));
        assert_ne!(checksum, PayloadChecksum::of(b"class B: ..."));
    }

    #[test]
    fn corrupt_payload_fails_checksum() {
        let mut bytes = encode_bundle(&indexed(sample())).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            decode_bundle(&bytes),
            Err(CacheError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn write_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("m.stc");
        let bundle = indexed(sample());
        write_bundle(&bundle, &path).unwrap();
        let loaded = load_bundle(&path).unwrap();
        assert_eq!(loaded.tree, bundle.tree);
        assert!(loaded.index_is_exact());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bundle(&dir.path().join("absent.stc")).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }
}
