//! The per-project content cache.

use std::path::{Path, PathBuf};

use ember_common::{apply_edits, SourceKind, SourceUnit, TextEdit};
use tracing::{debug, warn};

use crate::artifact::ArtifactFile;
use crate::error::CacheError;
use crate::hasher::SourceHasher;

/// Name of the engine log file kept in the cache directory.
///
/// [`ContentCache::clean_all`] never deletes it.
pub const LOG_FILE: &str = "live.log";

/// Extension appended to a source's base name for its cached artifact.
const ARTIFACT_EXT: &str = "bc";

/// New content for a unit supplied by the host alongside a compile request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceChange {
    /// Compile whatever is on disk.
    #[default]
    Unchanged,
    /// The full text of an unsaved buffer.
    Override(String),
    /// Byte-offset edits against the on-disk content, applied in order.
    Edits(Vec<TextEdit>),
}

impl SourceChange {
    /// Normalizes an empty edit list to [`SourceChange::Unchanged`].
    pub fn from_edits(edits: Vec<TextEdit>) -> Self {
        if edits.is_empty() {
            SourceChange::Unchanged
        } else {
            SourceChange::Edits(edits)
        }
    }
}

/// Outcome of [`ContentCache::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The unit is a header; it is never compiled on its own.
    Header,
    /// The unit is not a source file the engine compiles.
    Ignored,
    /// The snapshot matches the authoritative file. A cached artifact, if it
    /// loads, may be reused.
    Fresh {
        /// Path of the cached source snapshot.
        cached_source: PathBuf,
    },
    /// The snapshot differs from the authoritative file (or could not be
    /// fingerprinted) and must be compiled.
    Stale {
        /// Path of the cached source snapshot.
        cached_source: PathBuf,
    },
}

impl Resolution {
    /// Returns `true` when the unit has to go through the compiler.
    pub fn needs_compile(&self) -> bool {
        matches!(self, Resolution::Stale { .. })
    }

    /// The snapshot to hand to the compiler, if any.
    pub fn cached_source(&self) -> Option<&Path> {
        match self {
            Resolution::Header | Resolution::Ignored => None,
            Resolution::Fresh { cached_source } | Resolution::Stale { cached_source } => {
                Some(cached_source)
            }
        }
    }
}

/// Source snapshots and compiled artifacts for one project.
///
/// Every source maps to `<cache_dir>/<file name>` (the snapshot) and
/// `<cache_dir>/<file name>.bc` (the artifact). Identity is the base name,
/// so two sources with the same file name in different directories share
/// an entry.
#[derive(Debug)]
pub struct ContentCache {
    cache_dir: PathBuf,
    artifacts: ArtifactFile,
}

impl ContentCache {
    /// Opens (creating if needed) the cache rooted at `cache_dir`.
    pub fn open(cache_dir: impl Into<PathBuf>, engine_version: &str) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir).map_err(|e| CacheError::io(&cache_dir, e))?;
        Ok(Self {
            cache_dir,
            artifacts: ArtifactFile::new(engine_version),
        })
    }

    /// The cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the snapshot of `unit` lives.
    pub fn source_path(&self, unit: &SourceUnit) -> PathBuf {
        self.cache_dir.join(unit.file_name())
    }

    /// Where the compiled artifact of `unit` lives.
    pub fn artifact_path(&self, unit: &SourceUnit) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{ARTIFACT_EXT}", unit.file_name()))
    }

    /// Brings the snapshot of `unit` up to date with `change` and decides
    /// whether it needs compiling.
    ///
    /// An override or edited text replaces the snapshot only when it
    /// differs. Without either, a missing snapshot is copied from disk, and
    /// a snapshot that has drifted from disk is refreshed. Every snapshot
    /// write deletes the artifact built from the old snapshot and makes the
    /// unit stale, so an artifact always belongs to the snapshot beside it.
    pub fn resolve(
        &self,
        unit: &SourceUnit,
        change: &SourceChange,
    ) -> Result<Resolution, CacheError> {
        match unit.kind() {
            SourceKind::Header => return Ok(Resolution::Header),
            SourceKind::Other => return Ok(Resolution::Ignored),
            _ => {}
        }

        let cached_source = self.source_path(unit);
        let rewritten = match change {
            SourceChange::Override(text) => {
                let replaced = self.replace_snapshot(unit, text.as_bytes())?;
                if replaced {
                    debug!(unit = %unit.file_name(), "override replaces cached source");
                }
                replaced
            }
            SourceChange::Edits(edits) if !edits.is_empty() => {
                let edited = apply_edits(&read_source(unit)?, edits);
                let replaced = self.replace_snapshot(unit, &edited)?;
                if replaced {
                    debug!(unit = %unit.file_name(), edits = edits.len(), "edits applied to cached source");
                }
                replaced
            }
            _ if !cached_source.exists() => {
                self.write_snapshot(unit, &read_source(unit)?)?;
                true
            }
            _ => false,
        };
        if rewritten {
            return Ok(Resolution::Stale { cached_source });
        }

        let needs_compile = match (
            SourceHasher::hash_file(unit.path()),
            SourceHasher::hash_file(&cached_source),
        ) {
            (Ok(disk), Ok(cached)) => disk != cached,
            (Err(e), _) | (_, Err(e)) => {
                warn!(unit = %unit.file_name(), "cannot fingerprint: {e}");
                true
            }
        };

        if !needs_compile {
            return Ok(Resolution::Fresh { cached_source });
        }

        let from_disk = match change {
            SourceChange::Unchanged => true,
            SourceChange::Edits(edits) => edits.is_empty(),
            SourceChange::Override(_) => false,
        };
        if from_disk && unit.path().exists() {
            debug!(unit = %unit.file_name(), "cached source drifted from disk, refreshing");
            self.write_snapshot(unit, &read_source(unit)?)?;
        }
        Ok(Resolution::Stale { cached_source })
    }

    /// Writes `text` as the snapshot of `unit` unless it already holds it.
    /// Returns `true` if the snapshot was written.
    fn replace_snapshot(&self, unit: &SourceUnit, text: &[u8]) -> Result<bool, CacheError> {
        let current = read_if_exists(&self.source_path(unit))?;
        if current.as_deref() == Some(text) {
            return Ok(false);
        }
        self.write_snapshot(unit, text)?;
        Ok(true)
    }

    fn write_snapshot(&self, unit: &SourceUnit, text: &[u8]) -> Result<(), CacheError> {
        remove_if_exists(&self.artifact_path(unit))?;
        let snapshot = self.source_path(unit);
        remove_if_exists(&snapshot)?;
        write(&snapshot, text)
    }

    /// Loads the cached artifact of `unit`.
    ///
    /// Any failure is a miss; the reason is logged and `None` returned.
    pub fn load_artifact(&self, unit: &SourceUnit) -> Option<Vec<u8>> {
        let path = self.artifact_path(unit);
        if !path.exists() {
            return None;
        }
        match self.artifacts.read(&path) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(unit = %unit.file_name(), "cached artifact unusable: {e}");
                None
            }
        }
    }

    /// Persists a freshly compiled artifact, replacing the previous one.
    pub fn store_artifact(&self, unit: &SourceUnit, data: &[u8]) -> Result<(), CacheError> {
        self.artifacts.write(&self.artifact_path(unit), data)
    }

    /// Deletes the snapshot and artifact of `unit`.
    pub fn reset(&self, unit: &SourceUnit) -> Result<(), CacheError> {
        remove_if_exists(&self.source_path(unit))?;
        remove_if_exists(&self.artifact_path(unit))
    }

    /// Empties the cache directory except for the log file.
    ///
    /// Returns the number of entries removed. The directory itself is left
    /// in place (and recreated if it was missing).
    pub fn clean_all(&self) -> Result<usize, CacheError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))?;
        let entries =
            std::fs::read_dir(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.cache_dir, e))?;
            let path = entry.path();
            if entry.file_name() == LOG_FILE {
                continue;
            }
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|e| CacheError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

fn write(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    std::fs::write(path, data).map_err(|e| CacheError::io(path, e))
}

fn read_source(unit: &SourceUnit) -> Result<Vec<u8>, CacheError> {
    std::fs::read(unit.path()).map_err(|e| CacheError::io(unit.path(), e))
}
