//! Spawnguard Protection Core
//!
//! This crate owns the protection-state tracker and the damage arbitration
//! rules. It decides when a player's post-spawn protection window opens,
//! when it lapses, and whether a given damage event must be nullified.
//!
//! # Architecture Constraints
//!
//! The core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time (every operation takes an explicit `now`)
//! - Hold ambient/global state (the host owns the `ProtectionRegistry`)
//!
//! Everything the core cannot decide on its own (respawn anchors near a
//! position, whether an actor is NPC-controlled, who owns an entity) is
//! consulted through the collaborator traits defined below.
//!
//! # Modules
//!
//! - [`registry`]: per-player protection windows and first-spawn bookkeeping
//! - [`arbiter`]: the damage decision rules
//! - [`time_format`]: remaining-time rendering for notifications

#![deny(unsafe_code)]

pub mod arbiter;
pub mod registry;
pub mod time_format;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use arbiter::{
    ActorKind, Attacker, DamageEvent, DamageTarget, SuppressReason, Suppression, Verdict,
    arbitrate,
};
pub use registry::{ProtectionRegistry, ProtectionWindow};
pub use time_format::format_remaining;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable player identifier (survives reconnects and restarts).
///
/// Equality is exact; ordering exists only so persisted sets can be written
/// in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// The actor id a genuine player uses when dealing damage.
    pub fn as_actor(self) -> ActorId {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a non-player entity (structure, deployable, ...).
pub type EntityId = u64;

/// Identifier of whatever dealt damage. A genuine player's ActorId is the
/// raw value of its `PlayerId`.
pub type ActorId = u64;

/// World position `[x, y, z]`.
pub type Position = [f64; 3];

// ============================================================================
// Server Time
// ============================================================================

/// Point on the server's monotonic clock, measured from server start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Self = Self(Duration::ZERO);

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// `self + duration`, saturating at the clock's maximum.
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration))
    }

    /// Time from `earlier` to `self`; zero if `earlier` is later.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Radius (world units) within which a respawn anchor counts as "nearby".
pub const RESPAWN_ANCHOR_RADIUS: f64 = 2.0;

/// Default protection duration in seconds.
pub const DEFAULT_DURATION_SECONDS: i64 = 300;

// ============================================================================
// Configuration
// ============================================================================

/// Protection policy, read-only during arbitration.
///
/// The host owns the loaded copy and lends it to the registry and arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Window length in seconds. Negative values are treated as zero.
    pub duration_seconds: i64,
    /// Only a player's first recorded spawn is protected.
    pub only_first_spawn: bool,
    /// Spawning next to a bed / sleeping bag grants no protection.
    pub ignore_near_respawn_point: bool,
    pub protect_against_npc: bool,
    pub protect_against_animals: bool,
    /// Special hostile category (e.g. an aerial NPC threat).
    pub protect_against_special_hostile: bool,
    /// A protected player may not damage other players.
    pub protected_cannot_harm_others: bool,
    /// Entities owned by a protected player share the protection.
    pub protect_owned_entities: bool,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_DURATION_SECONDS,
            only_first_spawn: false,
            ignore_near_respawn_point: false,
            protect_against_npc: true,
            protect_against_animals: true,
            protect_against_special_hostile: true,
            protected_cannot_harm_others: true,
            protect_owned_entities: false,
        }
    }
}

impl ProtectionConfig {
    /// Window length with negative configured values clamped to zero.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds.max(0).unsigned_abs())
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Answers whether a respawn anchor (bed, sleeping bag, ...) is close to a
/// position.
pub trait RespawnAnchorProbe {
    fn any_respawn_anchor_nearby(&self, position: Position, radius: f64) -> bool;
}

/// Actor classification supplied by the game host.
pub trait ActorClassifier {
    /// The actor is a character driven by the server (scientist, bot, ...).
    fn is_npc_controlled(&self, actor: ActorId) -> bool;

    /// The actor carries a real player identity (not a trap, turret, ...).
    fn has_real_player_identity(&self, actor: ActorId) -> bool;

    /// The player owning a non-player entity, if any.
    fn resolve_owner(&self, entity: EntityId) -> Option<PlayerId>;
}

// ============================================================================
// Tests
// ============================================================================
