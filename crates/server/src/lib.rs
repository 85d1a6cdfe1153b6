//! Spawnguard Server Edge
//!
//! The Server Edge hosts the protection core inside a game server. It owns:
//! - The `ProtectionRegistry` instance (no global state)
//! - Deferred spawn handling (one tick after the spawn)
//! - The permission gate and first-spawn bookkeeping
//! - Damage interception and player notifications
//! - Persistence of the previously-connected set
//! - Configuration loading and localized messages
//!
//! # Tick Model
//!
//! Everything runs on the game's simulation thread. The host calls
//! [`Guard::step`] at each tick boundary; spawns observed during tick T
//! are processed by the step that enters tick T+1.
//!
//! # Spawn Ordering
//!
//! permission check → position sample → classify first spawn → mark
//! connected → persist → arm window → notify.

#![deny(unsafe_code)]

pub mod config;
pub mod lang;
pub mod logging;
pub mod spawn_queue;

use std::time::Duration;

use spawnguard_core::{
    ActorClassifier, DamageEvent, PlayerId, Position, ProtectionRegistry, RespawnAnchorProbe,
    Timestamp, Verdict, arbitrate, format_remaining,
};
use spawnguard_store::{ConnectedStore, load_or_empty};
use tracing::{debug, info, warn};

use config::GuardConfig;
use lang::MessageKey;
use spawn_queue::SpawnQueue;

// ============================================================================
// Parameters
// ============================================================================

/// Server simulation tick counter.
pub type Tick = u64;

/// Permission a player needs before any protection logic runs.
pub const PERMISSION_USE: &str = "spawnguard.use";

/// Ticks between a spawn event and its processing.
pub const SPAWN_DEFER_TICKS: Tick = 1;

// ============================================================================
// Host Collaborators
// ============================================================================

/// Delivers player-facing messages.
pub trait Notifier {
    fn notify(&mut self, player_id: PlayerId, key: MessageKey, args: &[String]);
}

/// Permission lookups.
pub trait PermissionGate {
    fn has_permission(&self, player_id: PlayerId, permission: &str) -> bool;
}

/// Current position of a connected player.
pub trait PositionSource {
    /// `None` once the player has left the server.
    fn position_of(&self, player_id: PlayerId) -> Option<Position>;
}

/// Collaborators needed to process deferred spawns.
pub struct SpawnContext<'a> {
    pub permissions: &'a dyn PermissionGate,
    pub positions: &'a dyn PositionSource,
    pub anchors: &'a dyn RespawnAnchorProbe,
    pub notifier: &'a mut dyn Notifier,
}

// ============================================================================
// Spawn Outcome
// ============================================================================

/// Result of processing one deferred spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A window was armed (or refreshed).
    Armed {
        player_id: PlayerId,
        expires_at: Timestamp,
        first_spawn: bool,
    },
    /// Policy declined protection (repeat spawn or respawn anchor nearby).
    NotArmed {
        player_id: PlayerId,
        first_spawn: bool,
    },
    /// Player lacks [`PERMISSION_USE`].
    NoPermission { player_id: PlayerId },
    /// Player left before the spawn was processed.
    PlayerGone { player_id: PlayerId },
}

// ============================================================================
// Guard
// ============================================================================

/// Hosts the protection core for one server.
pub struct Guard<S: ConnectedStore> {
    config: GuardConfig,
    registry: ProtectionRegistry,
    store: S,
    spawn_queue: SpawnQueue,
    tick: Tick,
}

impl<S: ConnectedStore> Guard<S> {
    /// Create a guard, seeding the previously-connected set from `store`.
    ///
    /// A failed load starts from an empty set.
    pub fn new(config: GuardConfig, store: S) -> Self {
        let connected = load_or_empty(&store);
        info!(
            target: "spawnguard::guard",
            connected = connected.len(),
            duration_seconds = config.protection.duration_seconds,
            only_first_spawn = config.protection.only_first_spawn,
            "guard started"
        );

        Self {
            config,
            registry: ProtectionRegistry::with_connected(connected),
            store,
            spawn_queue: SpawnQueue::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Swap in a reloaded configuration. Existing windows keep their expiry.
    pub fn set_config(&mut self, config: GuardConfig) {
        info!(target: "spawnguard::guard", "config replaced");
        self.config = config;
    }

    pub fn registry(&self) -> &ProtectionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProtectionRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn_queue.len()
    }

    // ========================================================================
    // Spawns
    // ========================================================================

    /// Record a spawn; it is processed by the next [`Guard::step`].
    pub fn on_player_spawned(&mut self, player_id: PlayerId) {
        let due = self.tick + SPAWN_DEFER_TICKS;
        if !self.spawn_queue.schedule(player_id, due) {
            debug!(target: "spawnguard::guard", player = %player_id, due, "spawn already queued");
        }
    }

    /// Advance to the next tick and process every spawn now due.
    pub fn step(&mut self, now: Timestamp, ctx: &mut SpawnContext<'_>) -> Vec<SpawnOutcome> {
        self.tick += 1;
        self.spawn_queue
            .take_due(self.tick)
            .into_iter()
            .map(|player_id| self.process_spawn(player_id, now, ctx))
            .collect()
    }

    fn process_spawn(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
        ctx: &mut SpawnContext<'_>,
    ) -> SpawnOutcome {
        if !ctx.permissions.has_permission(player_id, PERMISSION_USE) {
            return SpawnOutcome::NoPermission { player_id };
        }

        let Some(position) = ctx.positions.position_of(player_id) else {
            return SpawnOutcome::PlayerGone { player_id };
        };

        // Classify before marking; persist before anything else can read
        let first_spawn = !self.registry.has_connected_before(player_id);
        if self.registry.mark_connected(player_id) {
            self.persist_connected();
        }

        let armed = self.registry.begin_protection_if_eligible(
            player_id,
            position,
            now,
            first_spawn,
            &self.config.protection,
            ctx.anchors,
        );
        if !armed {
            return SpawnOutcome::NotArmed {
                player_id,
                first_spawn,
            };
        }

        let duration = self.config.protection.duration();
        let expires_at = now.saturating_add(duration);
        if self.registry.is_protected(player_id, now).is_some() {
            ctx.notifier.notify(
                player_id,
                MessageKey::ProtectionStarted,
                &[format_remaining(duration)],
            );
        }
        info!(
            target: "spawnguard::guard",
            player = %player_id,
            first_spawn,
            duration_secs = duration.as_secs(),
            "protection armed"
        );

        SpawnOutcome::Armed {
            player_id,
            expires_at,
            first_spawn,
        }
    }

    // ========================================================================
    // Damage
    // ========================================================================

    /// Arbitrate a damage event and notify the attacker if it is suppressed.
    ///
    /// The caller nullifies the damage when the verdict is suppressed.
    ///
    /// # Preconditions
    /// The event's victim must exist; validate before calling.
    pub fn on_damage(
        &mut self,
        event: &DamageEvent,
        now: Timestamp,
        actors: &dyn ActorClassifier,
        notifier: &mut dyn Notifier,
    ) -> Verdict {
        let verdict = arbitrate(
            event,
            now,
            &self.config.protection,
            &mut self.registry,
            actors,
        );

        if let Verdict::Suppress(suppression) = &verdict {
            debug!(
                target: "spawnguard::guard",
                reason = ?suppression.reason,
                remaining_secs = suppression.remaining.as_secs(),
                "damage suppressed"
            );
            if let Some(attacker) = suppression.notify {
                notifier.notify(
                    attacker,
                    MessageKey::from(suppression.reason),
                    &[format_remaining(suppression.remaining)],
                );
            }
        }

        verdict
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Tell the player how long their protection lasts.
    pub fn status(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
        notifier: &mut dyn Notifier,
    ) -> Option<Duration> {
        let remaining = self.registry.remaining(player_id, now);
        match remaining {
            Some(left) => notifier.notify(
                player_id,
                MessageKey::ProtectionStatus,
                &[format_remaining(left)],
            ),
            None => notifier.notify(player_id, MessageKey::NotProtected, &[]),
        }
        remaining
    }

    /// End a player's protection early. Returns whether it was active.
    pub fn revoke(
        &mut self,
        player_id: PlayerId,
        now: Timestamp,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let revoked = self.registry.revoke(player_id, now);
        if revoked {
            info!(target: "spawnguard::guard", player = %player_id, "protection revoked");
            notifier.notify(player_id, MessageKey::ProtectionRevoked, &[]);
        }
        revoked
    }

    /// Handle a map wipe / new save.
    ///
    /// With `reset_data_on_wipe`, drops all windows and the
    /// previously-connected set and persists the empty set. Returns whether
    /// data was reset.
    pub fn on_wipe(&mut self) -> bool {
        if !self.config.reset_data_on_wipe {
            info!(target: "spawnguard::guard", "wipe detected; keeping data");
            return false;
        }

        self.registry.reset();
        self.persist_connected();
        info!(target: "spawnguard::guard", "wipe detected; data reset");
        true
    }

    /// Re-read the previously-connected set from the store, replacing the
    /// in-memory set. Windows are untouched. Returns the number of players
    /// loaded.
    pub fn reload_connected(&mut self) -> usize {
        let connected = load_or_empty(&self.store);
        let count = connected.len();
        self.registry.replace_connected(connected);
        info!(target: "spawnguard::guard", connected = count, "connected players reloaded");
        count
    }

    fn persist_connected(&mut self) {
        if let Err(err) = self.store.save(self.registry.connected()) {
            warn!(target: "spawnguard::guard", error = %err, "connected players save failed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
