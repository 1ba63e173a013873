//! Ability definitions: authored data describing how an ability activates.

use core::fmt;

use crate::attribute::Attribute;
use crate::effect::EffectId;
use crate::ids::MontageId;
use crate::net::NetExecutionPolicy;
use crate::tags::{GameplayTag, InputTag, TagSet};

use super::targeting::MeleeTargeting;

/// Stable name of an ability definition.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AbilityId(pub String);

impl AbilityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Mutual-exclusion class read by the activation group arbiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationGroup {
    /// Runs alongside anything.
    #[default]
    Independent,
    /// Exclusive; a later exclusive activation cancels it.
    ExclusiveReplaceable,
    /// Exclusive; blocks every other exclusive activation while active.
    ExclusiveBlocking,
}

impl ActivationGroup {
    pub const fn is_exclusive(self) -> bool {
        !matches!(self, Self::Independent)
    }
}

/// What starts an ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationMethod {
    /// Activates once when the bound input is pressed.
    #[default]
    OnInputTriggered,
    /// Activates while the bound input is held and ends when it is released.
    WhileInputActive,
    /// Activates as soon as it is granted and the owner is ready.
    Passive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstancingPolicy {
    /// Activations share the spec; no per-activation storage.
    NonInstanced,
    /// One instance per owner holds activation state.
    #[default]
    InstancedPerActor,
}

// ============================================================================
// Costs and cooldowns
// ============================================================================

/// Cooldown effect applied when the ability commits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownConfig {
    pub effect: EffectId,
    /// Overrides the effect duration with `duration` through a set-by-caller magnitude.
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_set_by_caller_duration: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: f32,
}

impl CooldownConfig {
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: EffectId::new(effect),
            use_set_by_caller_duration: false,
            duration: 0.0,
        }
    }

    pub fn with_duration(effect: impl Into<String>, seconds: f32) -> Self {
        Self {
            effect: EffectId::new(effect),
            use_set_by_caller_duration: true,
            duration: seconds,
        }
    }
}

/// Attribute amount spent on commit.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityCost {
    pub attribute: Attribute,
    pub amount: f32,
}

// ============================================================================
// Behaviors
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeleeAttackDef {
    pub targeting: MeleeTargeting,
    /// Instant effect applied to every hit target; its damage is set by caller.
    pub damage_effect: EffectId,
    pub montage: Option<MontageId>,
    pub base_damage: f32,
}

/// What the ability does once active.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityBehavior {
    /// Stays active for `duration` seconds, or until ended externally.
    Generic {
        duration: Option<f32>,
        montage: Option<MontageId>,
    },
    /// Starts death on activation and finishes it when the ability ends.
    Death,
    /// Cancels abilities, resets the avatar and ends immediately.
    Reset,
    /// Waits for the owner's death and respawns it when allowed.
    AutoRespawn,
    MeleeAttack(MeleeAttackDef),
}

impl Default for AbilityBehavior {
    fn default() -> Self {
        Self::Generic {
            duration: None,
            montage: None,
        }
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Complete description of one ability class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDef {
    pub id: AbilityId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub behavior: AbilityBehavior,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_group: ActivationGroup,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_method: ActivationMethod,
    #[cfg_attr(feature = "serde", serde(default))]
    pub instancing: InstancingPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub net_execution: NetExecutionPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub input_tag: Option<InputTag>,
    /// Gameplay event that activates this ability.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trigger_event: Option<GameplayTag>,

    /// Tags describing the ability itself (`SurvivesDeath`, `Ultimate`, ...).
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_tags: TagSet,
    /// Tags the owner holds while the ability is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_owned_tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_required_tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub activation_blocked_tags: TagSet,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Option<AbilityCost>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: Option<CooldownConfig>,
    /// Applied on activation and left in place when the ability ends.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ongoing_effects: Vec<EffectId>,
    /// Applied on activation and removed when the ability ends.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ongoing_effects_removed_on_end: Vec<EffectId>,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub can_be_cancelled: bool,
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

impl AbilityDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: AbilityId::new(id),
            behavior: AbilityBehavior::default(),
            activation_group: ActivationGroup::Independent,
            activation_method: ActivationMethod::OnInputTriggered,
            instancing: InstancingPolicy::InstancedPerActor,
            net_execution: NetExecutionPolicy::LocalPredicted,
            input_tag: None,
            trigger_event: None,
            ability_tags: TagSet::empty(),
            activation_owned_tags: TagSet::empty(),
            activation_required_tags: TagSet::empty(),
            activation_blocked_tags: TagSet::DEAD_OR_DYING,
            cost: None,
            cooldown: None,
            ongoing_effects: Vec::new(),
            ongoing_effects_removed_on_end: Vec::new(),
            can_be_cancelled: true,
        }
    }

    /// Server-started ability triggered by the death event.
    ///
    /// Activates as independent so nothing can block it, then moves itself to
    /// the exclusive-blocking group once the abilities it cancels are gone.
    pub fn death(id: impl Into<String>) -> Self {
        Self::new(id)
            .with_behavior(AbilityBehavior::Death)
            .with_net_execution(NetExecutionPolicy::ServerInitiated)
            .with_trigger(GameplayTag::EventDeath)
            .with_ability_tags(TagSet::SURVIVES_DEATH)
            .with_blocked_tags(TagSet::empty())
            .not_cancellable()
    }

    /// Server-started ability triggered by the reset event.
    pub fn reset(id: impl Into<String>) -> Self {
        Self::new(id)
            .with_behavior(AbilityBehavior::Reset)
            .with_net_execution(NetExecutionPolicy::ServerInitiated)
            .with_trigger(GameplayTag::EventReset)
            .with_ability_tags(TagSet::SURVIVES_DEATH)
            .with_blocked_tags(TagSet::empty())
    }

    /// Server-only passive that respawns its owner after death.
    pub fn auto_respawn(id: impl Into<String>) -> Self {
        Self::new(id)
            .with_behavior(AbilityBehavior::AutoRespawn)
            .with_net_execution(NetExecutionPolicy::ServerOnly)
            .with_activation_method(ActivationMethod::Passive)
            .with_ability_tags(TagSet::SURVIVES_DEATH)
            .with_blocked_tags(TagSet::empty())
    }

    pub fn with_behavior(mut self, behavior: AbilityBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_group(mut self, group: ActivationGroup) -> Self {
        self.activation_group = group;
        self
    }

    pub fn with_activation_method(mut self, method: ActivationMethod) -> Self {
        self.activation_method = method;
        self
    }

    pub fn with_instancing(mut self, instancing: InstancingPolicy) -> Self {
        self.instancing = instancing;
        self
    }

    pub fn with_net_execution(mut self, policy: NetExecutionPolicy) -> Self {
        self.net_execution = policy;
        self
    }

    pub fn with_input(mut self, input: InputTag) -> Self {
        self.input_tag = Some(input);
        self
    }

    pub fn with_trigger(mut self, event: GameplayTag) -> Self {
        self.trigger_event = Some(event);
        self
    }

    pub fn with_ability_tags(mut self, tags: TagSet) -> Self {
        self.ability_tags = tags;
        self
    }

    pub fn with_owned_tags(mut self, tags: TagSet) -> Self {
        self.activation_owned_tags = tags;
        self
    }

    pub fn with_required_tags(mut self, tags: TagSet) -> Self {
        self.activation_required_tags = tags;
        self
    }

    pub fn with_blocked_tags(mut self, tags: TagSet) -> Self {
        self.activation_blocked_tags = tags;
        self
    }

    pub fn with_cost(mut self, attribute: Attribute, amount: f32) -> Self {
        self.cost = Some(AbilityCost { attribute, amount });
        self
    }

    pub fn with_cooldown(mut self, cooldown: CooldownConfig) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn with_ongoing_effect(mut self, effect: impl Into<String>) -> Self {
        self.ongoing_effects.push(EffectId::new(effect));
        self
    }

    pub fn with_effect_removed_on_end(mut self, effect: impl Into<String>) -> Self {
        self.ongoing_effects_removed_on_end
            .push(EffectId::new(effect));
        self
    }

    pub fn not_cancellable(mut self) -> Self {
        self.can_be_cancelled = false;
        self
    }

    pub fn survives_death(&self) -> bool {
        self.ability_tags.contains(TagSet::SURVIVES_DEATH)
    }

    pub fn is_ultimate(&self) -> bool {
        self.ability_tags.contains(TagSet::ULTIMATE)
    }

    pub fn is_instanced(&self) -> bool {
        self.instancing == InstancingPolicy::InstancedPerActor
    }
}
