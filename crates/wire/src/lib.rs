//! Spawnguard Data File Types
//!
//! Protobuf message types for the data the guard persists between server
//! restarts. Only the store crate reads and writes these; the core never
//! sees them.
//!
//! # Format Versions
//!
//! - 1: sorted list of previously connected player ids

#![deny(unsafe_code)]

use std::collections::HashSet;

use prost::Message;
use spawnguard_core::PlayerId;

/// Current `ConnectedPlayersFile` format version.
pub const CONNECTED_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Data File Messages
// ============================================================================

/// Players that have connected to this save at least once.
#[derive(Clone, PartialEq, Message)]
pub struct ConnectedPlayersFile {
    /// Format version; readers reject versions they do not know.
    #[prost(uint32, tag = "1")]
    pub format_version: u32,

    /// Player ids, ascending.
    #[prost(uint64, repeated, tag = "2")]
    pub player_ids: Vec<u64>,
}

impl ConnectedPlayersFile {
    /// Build a current-version file from a player set, ids sorted.
    pub fn from_players(players: &HashSet<PlayerId>) -> Self {
        let mut player_ids: Vec<u64> = players.iter().map(|p| p.0).collect();
        player_ids.sort_unstable();
        Self {
            format_version: CONNECTED_FORMAT_VERSION,
            player_ids,
        }
    }

    /// Collect the stored ids; duplicates collapse.
    pub fn into_players(self) -> HashSet<PlayerId> {
        self.player_ids.into_iter().map(PlayerId).collect()
    }

    pub fn encode_file(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_file_roundtrip() {
        let players = HashSet::from([PlayerId(30), PlayerId(10), PlayerId(20)]);
        let file = ConnectedPlayersFile::from_players(&players);
        assert_eq!(file.format_version, CONNECTED_FORMAT_VERSION);

        let decoded = ConnectedPlayersFile::decode(file.encode_file().as_slice()).unwrap();
        assert_eq!(decoded, file);
        assert_eq!(decoded.into_players(), players);
    }

    #[test]
    fn test_ids_written_sorted() {
        let players = HashSet::from([PlayerId(3), PlayerId(1), PlayerId(2)]);
        let file = ConnectedPlayersFile::from_players(&players);
        assert_eq!(file.player_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_file_decodes_as_version_zero() {
        // A zero-length file has every field defaulted
        let decoded = ConnectedPlayersFile::decode(&[][..]).unwrap();
        assert_eq!(decoded.format_version, 0);
        assert!(decoded.player_ids.is_empty());
    }
}
