//! Abilities: definitions, granted specs, activation state and the
//! activation-group arbiter.
//!
//! The state machine that drives specs lives in [`crate::system`]; this module
//! only holds the data it operates on.

mod arbiter;
mod def;
mod failure;
mod spec;
mod targeting;

pub use arbiter::{ActivationGroupArbiter, ArbiterError};
pub use def::{
    AbilityBehavior, AbilityCost, AbilityDef, AbilityId, ActivationGroup, ActivationMethod,
    CooldownConfig, InstancingPolicy, MeleeAttackDef,
};
pub use failure::ActivationFailure;
pub use spec::{
    AbilityInstance, AbilitySpec, AbilitySpecHandle, AbilityState, Continuation,
    ContinuationToken, TimerPurpose,
};
pub use targeting::MeleeTargeting;

use crate::ids::ActorId;

/// Payload carried by a gameplay event or a triggered activation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameplayEventData {
    pub instigator: Option<ActorId>,
    pub target: Option<ActorId>,
    pub magnitude: f32,
}

impl GameplayEventData {
    pub fn from_instigator(instigator: Option<ActorId>, magnitude: f32) -> Self {
        Self {
            instigator,
            target: None,
            magnitude,
        }
    }
}
