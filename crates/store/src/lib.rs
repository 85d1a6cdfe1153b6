//! Spawnguard Data Store
//!
//! Persists the previously-connected player set between server restarts.
//!
//! # Architecture
//!
//! - `ConnectedStore`: the seam the host talks to
//! - `FileStore`: prost-encoded `ConnectedPlayersFile` on disk
//! - `MemoryStore`: in-process store for tests and ephemeral servers
//! - `load_or_empty`: the host's startup path; a failed load is an empty set
//!
//! Writes are best-effort from the host's point of view: the store reports
//! errors, the host logs them and carries on.

#![deny(unsafe_code)]

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prost::Message;
use spawnguard_core::PlayerId;
use spawnguard_wire::{CONNECTED_FORMAT_VERSION, ConnectedPlayersFile};
use thiserror::Error;
use tracing::{debug, warn};

/// Default data file name, relative to the host's data directory.
pub const CONNECTED_FILE_NAME: &str = "spawnguard_connected.bin";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read connected players from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write connected players to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode connected players from {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },
    #[error("unsupported connected players format version {version} in {path:?}")]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

// ============================================================================
// Store Seam
// ============================================================================

/// Load/save of the previously-connected set.
pub trait ConnectedStore {
    fn load(&self) -> Result<HashSet<PlayerId>, StoreError>;

    fn save(&mut self, players: &HashSet<PlayerId>) -> Result<(), StoreError>;
}

/// Load the set, treating any failure as "no player has connected yet".
pub fn load_or_empty(store: &dyn ConnectedStore) -> HashSet<PlayerId> {
    match store.load() {
        Ok(players) => {
            debug!(target: "spawnguard::store", count = players.len(), "connected players loaded");
            players
        }
        Err(err) => {
            warn!(
                target: "spawnguard::store",
                error = %err,
                "connected players load failed; starting empty"
            );
            HashSet::new()
        }
    }
}

// ============================================================================
// File Store
// ============================================================================

/// Stores the set as a prost-encoded `ConnectedPlayersFile`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`CONNECTED_FILE_NAME`] inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(CONNECTED_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectedStore for FileStore {
    /// A missing file is an empty set, not an error.
    fn load(&self) -> Result<HashSet<PlayerId>, StoreError> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }
        read_connected(&self.path)
    }

    fn save(&mut self, players: &HashSet<PlayerId>) -> Result<(), StoreError> {
        write_connected(players, &self.path)
    }
}

/// Write the set to `path`, replacing any previous file.
///
/// The data goes to a sibling `.tmp` file first and is renamed into place.
pub fn write_connected(players: &HashSet<PlayerId>, path: &Path) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let encoded = ConnectedPlayersFile::from_players(players).encode_file();
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, &encoded).map_err(write_err)?;
    fs::rename(&tmp_path, path).map_err(write_err)?;

    debug!(
        target: "spawnguard::store",
        path = %path.display(),
        count = players.len(),
        "connected players saved"
    );
    Ok(())
}

/// Read a set previously written by [`write_connected`].
pub fn read_connected(path: &Path) -> Result<HashSet<PlayerId>, StoreError> {
    let data = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = ConnectedPlayersFile::decode(data.as_slice()).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if file.format_version != CONNECTED_FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: file.format_version,
        });
    }
    Ok(file.into_players())
}

// ============================================================================
// Memory Store
// ============================================================================

/// Keeps the set in memory. Counts saves so callers can observe write order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    players: HashSet<PlayerId>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(players: HashSet<PlayerId>) -> Self {
        Self { players, saves: 0 }
    }

    pub fn players(&self) -> &HashSet<PlayerId> {
        &self.players
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl ConnectedStore for MemoryStore {
    fn load(&self) -> Result<HashSet<PlayerId>, StoreError> {
        Ok(self.players.clone())
    }

    fn save(&mut self, players: &HashSet<PlayerId>) -> Result<(), StoreError> {
        self.players = players.clone();
        self.saves += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn players(ids: &[u64]) -> HashSet<PlayerId> {
        ids.iter().copied().map(PlayerId).collect()
    }

    #[test]
    fn test_file_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());

        store.save(&players(&[7, 3, 5])).unwrap();
        assert_eq!(store.load().unwrap(), players(&[3, 5, 7]));
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_file_is_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("connected.bin");
        let mut store = FileStore::new(path);
        store.save(&players(&[1])).unwrap();
        assert_eq!(store.load().unwrap(), players(&[1]));
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path());
        store.save(&players(&[1, 2, 3])).unwrap();
        store.save(&HashSet::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_reports_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        fs::write(store.path(), [0xff, 0xff, 0xff]).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "unexpected error: {err}");
        assert!(load_or_empty(&store).is_empty());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        let file = ConnectedPlayersFile {
            format_version: 99,
            player_ids: vec![1],
        };
        fs::write(store.path(), file.encode_file()).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { version: 99, .. }));
        assert!(load_or_empty(&store).is_empty());
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::with_players(players(&[1]));
        assert_eq!(store.load().unwrap(), players(&[1]));

        store.save(&players(&[1, 2])).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.players(), &players(&[1, 2]));
    }
}
