//! Self-validating artifact files.
//!
//! Each compiled artifact is written as a 4-byte little-endian header length,
//! a bincode-encoded [`ArtifactHeader`] and the raw payload. Reads check the
//! magic bytes, the format and engine versions, and the payload checksum.

use std::path::Path;

use ember_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

const ARTIFACT_MAGIC: [u8; 4] = *b"EMBR";

/// Bumped whenever the header or payload layout changes.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every cached artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"EMBR"`.
    pub magic: [u8; 4],
    /// Artifact format version.
    pub format_version: u32,
    /// Version of the engine that produced the artifact.
    pub engine_version: String,
    /// Fingerprint of the payload.
    pub checksum: ContentHash,
}

/// Reads and writes artifact files for one engine version.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    engine_version: String,
}

impl ArtifactFile {
    /// Creates a reader/writer that stamps and expects `engine_version`.
    pub fn new(engine_version: impl Into<String>) -> Self {
        Self {
            engine_version: engine_version.into(),
        }
    }

    /// Writes `data` to `path` behind a validation header, replacing any
    /// existing file.
    pub fn write(&self, path: &Path, data: &[u8]) -> Result<(), CacheError> {
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            engine_version: self.engine_version.clone(),
            checksum: ContentHash::from_bytes(data),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        std::fs::write(path, &output).map_err(|e| CacheError::io(path, e))
    }

    /// Reads and validates the artifact at `path`, returning its payload.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, CacheError> {
        let raw = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("file shorter than header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize
            .checked_add(header_len)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| invalid("truncated header"))?;

        let (header, _): (ArtifactHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..header_end], bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != ARTIFACT_MAGIC {
            return Err(invalid("bad magic"));
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: format!("format {ARTIFACT_FORMAT_VERSION}"),
                actual: format!("format {}", header.format_version),
            });
        }
        if header.engine_version != self.engine_version {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: self.engine_version.clone(),
                actual: header.engine_version,
            });
        }

        let payload = &raw[header_end..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(payload.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp.bc");
        let file = ArtifactFile::new("0.1.0");
        file.write(&path, b"BC\xc0\xde payload").unwrap();
        assert_eq!(file.read(&path).unwrap(), b"BC\xc0\xde payload");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactFile::new("0.1.0")
            .read(&dir.path().join("nope.bc"))
            .unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn corrupted_payload_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp.bc");
        let file = ArtifactFile::new("0.1.0");
        file.write(&path, b"original payload").unwrap();

        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();

        assert!(matches!(
            file.read(&path).unwrap_err(),
            CacheError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp.bc");
        std::fs::write(&path, [0x40, 0, 0, 0, 1, 2]).unwrap();
        assert!(matches!(
            ArtifactFile::new("0.1.0").read(&path).unwrap_err(),
            CacheError::InvalidHeader { .. }
        ));

        std::fs::write(&path, [1, 2]).unwrap();
        assert!(ArtifactFile::new("0.1.0").read(&path).is_err());
    }

    #[test]
    fn raw_bitcode_without_header_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp.bc");
        std::fs::write(&path, b"BC\xc0\xde\x35\x14\x00\x00\x05\x00\x00\x00").unwrap();
        assert!(ArtifactFile::new("0.1.0").read(&path).is_err());
    }

    #[test]
    fn engine_version_mismatch_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp.bc");
        ArtifactFile::new("0.1.0").write(&path, b"ir").unwrap();
        assert!(matches!(
            ArtifactFile::new("0.2.0").read(&path).unwrap_err(),
            CacheError::VersionMismatch { .. }
        ));
    }
}
