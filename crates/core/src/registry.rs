//! Protection window tracking.
//!
//! - At most one window per player; a new grant replaces the old expiry.
//! - A window with `expires_at <= now` is absent. Expired entries are purged
//!   lazily by `is_protected`; there is no sweep timer.
//! - The previously-connected set only grows, except on a full reset.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::debug;

use crate::{
    PlayerId, Position, ProtectionConfig, RESPAWN_ANCHOR_RADIUS, RespawnAnchorProbe, Timestamp,
};

/// Active protection for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionWindow {
    pub player_id: PlayerId,
    pub expires_at: Timestamp,
}

/// Owns every protection window and the first-spawn bookkeeping.
#[derive(Debug, Default)]
pub struct ProtectionRegistry {
    windows: HashMap<PlayerId, ProtectionWindow>,
    connected: HashSet<PlayerId>,
}

impl ProtectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with a persisted previously-connected set.
    pub fn with_connected(connected: HashSet<PlayerId>) -> Self {
        Self {
            windows: HashMap::new(),
            connected,
        }
    }

    // ========================================================================
    // Protection Windows
    // ========================================================================

    /// Arm (or refresh) a player's window after a spawn.
    ///
    /// Skipped when `only_first_spawn` is set and this is a repeat spawn, or
    /// when `ignore_near_respawn_point` is set and `anchors` reports a
    /// respawn anchor within [`RESPAWN_ANCHOR_RADIUS`]. A skipped call leaves
    /// any existing window untouched.
    ///
    /// Otherwise the expiry becomes `now + duration`, replacing any previous
    /// expiry. A zero duration still arms a window; it is simply expired on
    /// creation.
    ///
    /// Returns whether a window was (re)armed.
    pub fn begin_protection_if_eligible(
        &mut self,
        player_id: PlayerId,
        spawn_position: Position,
        now: Timestamp,
        is_first_spawn: bool,
        config: &ProtectionConfig,
        anchors: &dyn RespawnAnchorProbe,
    ) -> bool {
        if config.only_first_spawn && !is_first_spawn {
            debug!(target: "spawnguard::registry", player = %player_id, "skip: repeat spawn");
            return false;
        }

        if config.ignore_near_respawn_point
            && anchors.any_respawn_anchor_nearby(spawn_position, RESPAWN_ANCHOR_RADIUS)
        {
            debug!(
                target: "spawnguard::registry",
                player = %player_id,
                "skip: respawn anchor nearby"
            );
            return false;
        }

        let expires_at = now.saturating_add(config.duration());
        self.windows.insert(
            player_id,
            ProtectionWindow {
                player_id,
                expires_at,
            },
        );
        debug!(
            target: "spawnguard::registry",
            player = %player_id,
            expires_at = ?expires_at.as_duration(),
            "window armed"
        );
        true
    }

    /// Expiry of the player's window if it is still active at `now`.
    ///
    /// An expired window is removed as a side effect.
    pub fn is_protected(&mut self, player_id: PlayerId, now: Timestamp) -> Option<Timestamp> {
        let window = self.windows.get(&player_id)?;
        if now < window.expires_at {
            return Some(window.expires_at);
        }

        self.windows.remove(&player_id);
        None
    }

    /// Time left on the player's window, if active.
    pub fn remaining(&mut self, player_id: PlayerId, now: Timestamp) -> Option<Duration> {
        self.is_protected(player_id, now)
            .map(|expires_at| expires_at.saturating_duration_since(now))
    }

    /// End a player's window early. Returns whether an active window existed.
    pub fn revoke(&mut self, player_id: PlayerId, now: Timestamp) -> bool {
        let active = self.is_protected(player_id, now).is_some();
        self.windows.remove(&player_id);
        active
    }

    /// Drop all windows.
    pub fn clear_all(&mut self) {
        self.windows.clear();
    }

    /// Number of stored windows, including expired ones not yet purged.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    // ========================================================================
    // Previously Connected Set
    // ========================================================================

    pub fn has_connected_before(&self, player_id: PlayerId) -> bool {
        self.connected.contains(&player_id)
    }

    /// Record that the player has connected. Returns `true` if newly added.
    pub fn mark_connected(&mut self, player_id: PlayerId) -> bool {
        self.connected.insert(player_id)
    }

    pub fn connected(&self) -> &HashSet<PlayerId> {
        &self.connected
    }

    /// Replace the previously-connected set (e.g. after loading from disk).
    pub fn replace_connected(&mut self, connected: HashSet<PlayerId>) {
        self.connected = connected;
    }

    /// Full data reset: all windows and the previously-connected set.
    pub fn reset(&mut self) {
        self.windows.clear();
        self.connected.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
