//! Outbound notifications consumed by UI, analytics and other gameplay systems.
//!
//! Every ability system queues [`GameplayMessage`]s; the runtime drains the
//! queue after each step and fans the messages out on its event bus.

use crate::ability::{AbilityId, AbilitySpecHandle};
use crate::attribute::Attribute;
use crate::effect::EffectId;
use crate::ids::{ActorId, MontageId};
use crate::tags::GameplayTag;

/// One notification emitted by the ability system of `owner`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameplayMessage {
    pub owner: ActorId,
    pub kind: MessageKind,
}

impl GameplayMessage {
    pub fn new(owner: ActorId, kind: MessageKind) -> Self {
        Self { owner, kind }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    // ========================================================================
    // Abilities
    // ========================================================================
    AbilityGranted {
        handle: AbilitySpecHandle,
        ability: AbilityId,
    },
    AbilityRemoved {
        handle: AbilitySpecHandle,
        ability: AbilityId,
    },
    AbilityActivated {
        handle: AbilitySpecHandle,
        ability: AbilityId,
    },
    AbilityEnded {
        handle: AbilitySpecHandle,
        ability: AbilityId,
        cancelled: bool,
    },
    /// Activation failed; `reason` is the failure tag shown to the player.
    ActivationFailed {
        handle: AbilitySpecHandle,
        reason: GameplayTag,
    },
    MontagePlayed {
        handle: AbilitySpecHandle,
        montage: MontageId,
    },
    MontageStopped {
        handle: AbilitySpecHandle,
        montage: MontageId,
    },

    // ========================================================================
    // Cooldowns (authoritative only)
    // ========================================================================
    CooldownStarted {
        handle: AbilitySpecHandle,
        ability: AbilityId,
        remaining: f32,
    },
    CooldownEnded {
        handle: AbilitySpecHandle,
        ability: AbilityId,
    },

    // ========================================================================
    // Attributes
    // ========================================================================
    AttributeChanged {
        attribute: Attribute,
        old: f32,
        new: f32,
        instigator: Option<ActorId>,
        effect: Option<EffectId>,
    },
    DamageTaken {
        instigator: Option<ActorId>,
        amount: f32,
    },
    HealingReceived {
        instigator: Option<ActorId>,
        amount: f32,
    },
    OutOfHealth {
        instigator: Option<ActorId>,
        causer: Option<ActorId>,
        magnitude: f32,
    },

    // ========================================================================
    // Lifecycle
    // ========================================================================
    DeathStarted {
        generation: u32,
    },
    DeathFinished {
        generation: u32,
    },
    PlayerReset,
    RespawnStarted {
        duration: f32,
    },
    RespawnCompleted,
    /// The owner cannot respawn and became a spectator.
    RespawnFailed,
}

impl MessageKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AbilityGranted { .. } => "ability_granted",
            Self::AbilityRemoved { .. } => "ability_removed",
            Self::AbilityActivated { .. } => "ability_activated",
            Self::AbilityEnded { .. } => "ability_ended",
            Self::ActivationFailed { .. } => "activation_failed",
            Self::MontagePlayed { .. } => "montage_played",
            Self::MontageStopped { .. } => "montage_stopped",
            Self::CooldownStarted { .. } => "cooldown_started",
            Self::CooldownEnded { .. } => "cooldown_ended",
            Self::AttributeChanged { .. } => "attribute_changed",
            Self::DamageTaken { .. } => "damage_taken",
            Self::HealingReceived { .. } => "healing_received",
            Self::OutOfHealth { .. } => "out_of_health",
            Self::DeathStarted { .. } => "death_started",
            Self::DeathFinished { .. } => "death_finished",
            Self::PlayerReset => "player_reset",
            Self::RespawnStarted { .. } => "respawn_started",
            Self::RespawnCompleted => "respawn_completed",
            Self::RespawnFailed => "respawn_failed",
        }
    }
}
