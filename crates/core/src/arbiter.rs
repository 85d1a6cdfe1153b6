//! Damage arbitration.
//!
//! [`arbitrate`] decides one damage event at a time. Rules are evaluated in
//! order and the first match wins:
//!
//! 1. Player target with an active window: exempt attacker categories
//!    (NPC, animal, special hostile) are allowed through when their
//!    protection flag is off; everything else is suppressed.
//! 2. Player target, genuine player attacker who is protected while
//!    `protected_cannot_harm_others` is set: suppressed.
//! 3. Owned entity whose genuine-player owner is protected, attacked by a
//!    genuine player, with `protect_owned_entities` set: suppressed.
//! 4. Anything else is allowed.
//!
//! Victim protection always takes precedence over the attacker restriction.
//!
//! # Preconditions
//!
//! The caller rejects events without a resolvable victim before calling
//! [`arbitrate`]; the arbiter does not re-check.

use std::time::Duration;

use crate::{
    ActorClassifier, ActorId, EntityId, PlayerId, ProtectionConfig, ProtectionRegistry, Timestamp,
};

// ============================================================================
// Event Types
// ============================================================================

/// What is being damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTarget {
    Player(PlayerId),
    /// A non-player entity; its owner is resolved through the classifier.
    Owned(EntityId),
}

/// Coarse classification of the damage source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// A player character. May still be NPC-controlled.
    Player,
    Npc,
    Animal,
    SpecialHostile,
    /// Traps, turrets, environment and anything else.
    Other,
}

/// The entity that dealt the damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attacker {
    pub id: ActorId,
    pub kind: ActorKind,
}

impl Attacker {
    pub fn player(player_id: PlayerId) -> Self {
        Self {
            id: player_id.as_actor(),
            kind: ActorKind::Player,
        }
    }

    pub fn new(id: ActorId, kind: ActorKind) -> Self {
        Self { id, kind }
    }
}

/// A single damage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub target: DamageTarget,
    pub attacker: Option<Attacker>,
}

// ============================================================================
// Verdict
// ============================================================================

/// Why damage was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The victim is protected.
    VictimProtected,
    /// The attacker is protected and may not deal damage.
    AttackerProtected,
    /// The damaged entity's owner is protected.
    OwnerProtected,
}

/// A suppressed damage event and who should hear about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suppression {
    pub reason: SuppressReason,
    /// Time left on the window that caused the suppression.
    pub remaining: Duration,
    /// Genuine player to notify, if any.
    pub notify: Option<PlayerId>,
}

/// Outcome of arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Suppress(Suppression),
}

impl Verdict {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppress(_))
    }

    pub fn suppression(&self) -> Option<&Suppression> {
        match self {
            Self::Allow => None,
            Self::Suppress(suppression) => Some(suppression),
        }
    }
}

// ============================================================================
// Arbitration
// ============================================================================

/// Decide whether `event` must be nullified at `now`.
///
/// Reads (and lazily purges) windows in `registry`; holds no state itself.
pub fn arbitrate(
    event: &DamageEvent,
    now: Timestamp,
    config: &ProtectionConfig,
    registry: &mut ProtectionRegistry,
    actors: &dyn ActorClassifier,
) -> Verdict {
    let attacker_player = event
        .attacker
        .as_ref()
        .and_then(|attacker| genuine_player(attacker, actors));

    match event.target {
        DamageTarget::Player(victim) => {
            // Rule 1: victim protection
            if let Some(expires_at) = registry.is_protected(victim, now) {
                if let Some(attacker) = &event.attacker
                    && is_exempt(attacker, config, actors)
                {
                    return Verdict::Allow;
                }
                return suppress(
                    SuppressReason::VictimProtected,
                    expires_at,
                    now,
                    attacker_player,
                );
            }

            // Rule 2: protected attacker may not harm others
            if config.protected_cannot_harm_others
                && let Some(attacker) = attacker_player
                && let Some(expires_at) = registry.is_protected(attacker, now)
            {
                return suppress(
                    SuppressReason::AttackerProtected,
                    expires_at,
                    now,
                    Some(attacker),
                );
            }
        }
        DamageTarget::Owned(entity) => {
            // Rule 3: owned entity protection
            if config.protect_owned_entities
                && let Some(attacker) = attacker_player
                && let Some(owner) = actors.resolve_owner(entity)
                && is_genuine_identity(owner.as_actor(), actors)
                && let Some(expires_at) = registry.is_protected(owner, now)
            {
                return suppress(
                    SuppressReason::OwnerProtected,
                    expires_at,
                    now,
                    Some(attacker),
                );
            }
        }
    }

    Verdict::Allow
}

fn suppress(
    reason: SuppressReason,
    expires_at: Timestamp,
    now: Timestamp,
    notify: Option<PlayerId>,
) -> Verdict {
    Verdict::Suppress(Suppression {
        reason,
        remaining: expires_at.saturating_duration_since(now),
        notify,
    })
}

/// Attacker categories that bypass victim protection when their flag is off.
fn is_exempt(attacker: &Attacker, config: &ProtectionConfig, actors: &dyn ActorClassifier) -> bool {
    match attacker.kind {
        ActorKind::Npc => !config.protect_against_npc,
        ActorKind::Player if actors.is_npc_controlled(attacker.id) => !config.protect_against_npc,
        ActorKind::Animal => !config.protect_against_animals,
        ActorKind::SpecialHostile => !config.protect_against_special_hostile,
        ActorKind::Player | ActorKind::Other => false,
    }
}

/// The attacker's PlayerId if it is a genuine (non-NPC, real identity) player.
fn genuine_player(attacker: &Attacker, actors: &dyn ActorClassifier) -> Option<PlayerId> {
    (attacker.kind == ActorKind::Player && is_genuine_identity(attacker.id, actors))
        .then_some(PlayerId(attacker.id))
}

fn is_genuine_identity(actor: ActorId, actors: &dyn ActorClassifier) -> bool {
    !actors.is_npc_controlled(actor) && actors.has_real_player_identity(actor)
}

// ============================================================================
// Tests
// ============================================================================
