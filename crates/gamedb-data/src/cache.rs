//! Binary snapshot cache for [`GameDb`].
//!
//! The cache is a bitcode blob with a versioned header. It is an
//! optimization only: the loader rebuilds every table from the source
//! workbooks when the cache is missing or unreadable.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::db::GameDb;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a gamedb cache file.
pub const CACHE_MAGIC: u32 = 0x6DB0_0001;

/// Current format version. Increment when a record shape changes.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", CACHE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported cache version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("cache from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("cache I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header stored ahead of the snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: FORMAT_VERSION,
        }
    }
}

impl SnapshotHeader {
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.magic != CACHE_MAGIC {
            return Err(CacheError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(CacheError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    header: SnapshotHeader,
    db: &'a GameDb,
}

#[derive(Deserialize)]
struct Snapshot {
    header: SnapshotHeader,
    db: GameDb,
}

// ---------------------------------------------------------------------------
// GameDb serialization
// ---------------------------------------------------------------------------

impl GameDb {
    /// Encode the snapshot. `on_demand` is not included.
    pub fn serialize(&self) -> Result<Vec<u8>, CacheError> {
        let snapshot = SnapshotRef {
            header: SnapshotHeader::default(),
            db: self,
        };
        bitcode::serialize(&snapshot).map_err(|e| CacheError::Encode(e.to_string()))
    }

    /// Decode a snapshot, validating its header. `on_demand` comes back
    /// empty.
    pub fn deserialize(data: &[u8]) -> Result<Self, CacheError> {
        // bitcode has no partial decoding, so the header is checked after
        // the whole payload decodes.
        let snapshot: Snapshot =
            bitcode::deserialize(data).map_err(|e| CacheError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot.db)
    }
}

/// Write `db` to the cache file at `path`.
pub fn write_cache(db: &GameDb, path: &Path) -> Result<(), CacheError> {
    let started = Instant::now();
    let bytes = db.serialize()?;
    std::fs::write(path, &bytes).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "cache written"
    );
    Ok(())
}

/// Read and decode the cache file at `path`.
pub fn read_cache(path: &Path) -> Result<GameDb, CacheError> {
    let started = Instant::now();
    let bytes = std::fs::read(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let db = GameDb::deserialize(&bytes)?;
    tracing::info!(
        path = %path.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "cache loaded"
    );
    Ok(db)
}
