//! Deferred spawn processing.
//!
//! A spawn observed during tick T is handled at tick T + `SPAWN_DEFER_TICKS`,
//! once the spawn has fully completed and the player's position is final.
//! - Buffer keyed by due tick, drained in tick order
//! - One entry per (player, due tick); repeated spawns in the same tick collapse
//! - No cancellation: a queued spawn runs or the process exits

use std::collections::BTreeMap;

use spawnguard_core::PlayerId;

use crate::Tick;

/// Spawns waiting for their due tick.
#[derive(Debug, Default)]
pub struct SpawnQueue {
    /// Players keyed by the tick at which they are processed, in arrival order.
    pending: BTreeMap<Tick, Vec<PlayerId>>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `player_id` for processing at `due_tick`.
    ///
    /// Returns `false` if the player was already queued for that tick.
    pub fn schedule(&mut self, player_id: PlayerId, due_tick: Tick) -> bool {
        let players = self.pending.entry(due_tick).or_default();
        if players.contains(&player_id) {
            return false;
        }
        players.push(player_id);
        true
    }

    /// Remove and return every player due at or before `tick`.
    ///
    /// Earlier ticks come first; within a tick, arrival order is kept.
    pub fn take_due(&mut self, tick: Tick) -> Vec<PlayerId> {
        let later = match tick.checked_add(1) {
            Some(next) => self.pending.split_off(&next),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending, later);
        due.into_values().flatten().collect()
    }

    /// Number of queued spawns.
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
