//! Granted abilities and their per-owner activation state.

use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::config::GameplayConfig;
use crate::effect::ActiveEffectHandle;
use crate::ids::{ActorId, MontageId};
use crate::prediction::PredictionKey;
use crate::tags::{GameplayTag, InputTag, TagSet};

use super::{AbilityDef, ActivationGroup, GameplayEventData};

/// Stable reference to one grant of an ability. Handles are the only safe
/// external reference to a spec and are mirrored verbatim on the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySpecHandle(pub u32);

impl core::fmt::Display for AbilitySpecHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ability#{}", self.0)
    }
}

/// Lifecycle of one activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityState {
    #[default]
    Inactive,
    Activating,
    Active,
    Ending,
}

impl AbilityState {
    /// True from the start of activation until teardown completes.
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// What a multi-tick timer continuation does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerPurpose {
    /// End the ability.
    EndAbility,
    /// Decide whether the owner can respawn (runs one tick after death).
    RespawnCheck,
    /// The respawn countdown ran out.
    Respawn,
}

/// Sub-state of an active ability waiting for something to happen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Continuation {
    WaitingForEvent { tag: GameplayTag },
    WaitingForTimer { remaining: f32, purpose: TimerPurpose },
    /// Server side: waiting for the client's targets.
    WaitingForTargetData,
}

/// Monotonic token identifying the continuation an instance is parked on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContinuationToken(pub u32);

/// Activation state of a spec.
#[derive(Clone, Debug, Default)]
pub struct AbilityInstance {
    pub state: AbilityState,
    /// Group the running activation is registered under; can change mid-activation.
    pub group: ActivationGroup,
    /// Key the activation runs under, if predicted or confirmed.
    pub activation_key: Option<PredictionKey>,
    pub payload: Option<GameplayEventData>,
    pub montage: Option<MontageId>,
    /// "Remove on end" effects; only instanced abilities keep any.
    pub retained_effects: ArrayVec<ActiveEffectHandle, { GameplayConfig::MAX_RETAINED_EFFECTS }>,
    pub continuation: Option<(ContinuationToken, Continuation)>,
    next_token: u32,
    pub can_be_cancelled: bool,
    /// Respawn flow may still complete; a reset clears it.
    pub should_finish_reset: bool,
}

impl AbilityInstance {
    /// Parks the instance on `continuation`, replacing any previous one.
    pub fn park(&mut self, continuation: Continuation) -> ContinuationToken {
        self.next_token = self.next_token.wrapping_add(1);
        let token = ContinuationToken(self.next_token);
        self.continuation = Some((token, continuation));
        token
    }

    pub fn clear_continuation(&mut self) {
        self.continuation = None;
    }

    /// Waiting on `tag`?
    pub fn awaits_event(&self, tag: GameplayTag) -> bool {
        matches!(
            self.continuation,
            Some((_, Continuation::WaitingForEvent { tag: t })) if t == tag
        )
    }

    pub fn awaits_target_data(&self) -> bool {
        matches!(self.continuation, Some((_, Continuation::WaitingForTargetData)))
    }
}

/// One grant of an ability to an owner.
#[derive(Clone, Debug)]
pub struct AbilitySpec {
    pub handle: AbilitySpecHandle,
    pub def: Arc<AbilityDef>,
    pub level: u32,
    /// Actor or object that granted the ability (for attribution).
    pub source: Option<ActorId>,
    /// Tags added to this grant at runtime (`Disabled`).
    pub dynamic_tags: TagSet,
    /// Input bound to this grant; defaults to the definition's input.
    pub input_tag: Option<InputTag>,
    pub input_pressed: bool,
    pub instance: AbilityInstance,
}

impl AbilitySpec {
    pub fn new(
        handle: AbilitySpecHandle,
        def: Arc<AbilityDef>,
        level: u32,
        source: Option<ActorId>,
    ) -> Self {
        let input_tag = def.input_tag;
        Self {
            handle,
            def,
            level: level.max(1),
            source,
            dynamic_tags: TagSet::empty(),
            input_tag,
            input_pressed: false,
            instance: AbilityInstance::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.instance.state.is_running()
    }

    /// Definition tags plus runtime tags.
    pub fn tags(&self) -> TagSet {
        self.def.ability_tags | self.dynamic_tags
    }

    pub fn is_disabled(&self) -> bool {
        self.tags().contains(TagSet::DISABLED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parking_replaces_previous_continuation() {
        let mut instance = AbilityInstance::default();
        let first = instance.park(Continuation::WaitingForEvent {
            tag: GameplayTag::EventMeleeHit,
        });
        assert!(instance.awaits_event(GameplayTag::EventMeleeHit));

        let second = instance.park(Continuation::WaitingForTargetData);
        assert_ne!(first, second);
        assert!(!instance.awaits_event(GameplayTag::EventMeleeHit));
        assert!(instance.awaits_target_data());
    }

    #[test]
    fn disabled_through_runtime_tags() {
        let mut spec = AbilitySpec::new(
            AbilitySpecHandle(1),
            Arc::new(AbilityDef::new("ga.jump")),
            0,
            None,
        );
        assert_eq!(spec.level, 1);
        assert!(!spec.is_disabled());
        spec.dynamic_tags |= TagSet::DISABLED;
        assert!(spec.is_disabled());
    }
}
