//! Capability tags recognized by the core.
//!
//! The host engine expresses state with free-form hierarchical tag strings.
//! The core only understands the closed set below: [`GameplayTag`] is the
//! mapping table between engine tag names and core tags, [`TagSet`] is the
//! bitset used for static tag lists in ability/effect definitions, and
//! [`TagCountContainer`] holds the counted tags an ability-owner currently has.

use std::collections::BTreeMap;

use bitflags::bitflags;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Tags the core reacts to, with their engine names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumString, AsRefStr, IntoStaticStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum GameplayTag {
    // ========================================================================
    // Ability behavior
    // ========================================================================
    /// Ability is not cancelled when its owner dies.
    #[strum(serialize = "Ability.Behavior.SurvivesDeath")]
    AbilitySurvivesDeath,
    /// Ability is disabled and cannot activate.
    #[strum(serialize = "Ability.Behavior.Disabled")]
    AbilityDisabled,
    #[strum(serialize = "Ability.Type.Ultimate")]
    AbilityUltimate,
    #[strum(serialize = "Ability.Type.Weapon")]
    AbilityWeapon,

    // ========================================================================
    // Activation failure reasons (surfaced to UI)
    // ========================================================================
    #[strum(serialize = "Ability.ActivateFail.Disabled")]
    FailDisabled,
    #[strum(serialize = "Ability.ActivateFail.ActivationGroup")]
    FailActivationGroup,
    #[strum(serialize = "Ability.ActivateFail.TagsBlocked")]
    FailTagsBlocked,
    #[strum(serialize = "Ability.ActivateFail.TagsMissing")]
    FailTagsMissing,
    #[strum(serialize = "Ability.ActivateFail.Networking")]
    FailNetworking,
    #[strum(serialize = "Ability.ActivateFail.InvalidAvatar")]
    FailInvalidAvatar,
    #[strum(serialize = "Ability.ActivateFail.Cooldown")]
    FailCooldown,
    #[strum(serialize = "Ability.ActivateFail.Cost")]
    FailCost,
    #[strum(serialize = "Ability.ActivateFail.AlreadyActive")]
    FailAlreadyActive,

    // ========================================================================
    // Owner state
    // ========================================================================
    #[strum(serialize = "State.Dying")]
    StateDying,
    #[strum(serialize = "State.Dead")]
    StateDead,
    #[strum(serialize = "State.ImmuneToDamage")]
    StateImmuneToDamage,
    #[strum(serialize = "State.Spectating")]
    StateSpectating,
    #[strum(serialize = "Gameplay.AbilityInputBlocked")]
    AbilityInputBlocked,

    // ========================================================================
    // Effect asset tags
    // ========================================================================
    /// Damage that ignores damage immunity and may hit its own instigator.
    #[strum(serialize = "Effects.Damage.SelfDestruct")]
    DamageSelfDestruct,
    /// Damage that is allowed to hit its own instigator.
    #[strum(serialize = "Effects.Damage.CanDamageSelf")]
    DamageCanDamageSelf,
    #[strum(serialize = "Effects.UltimateCharge.FromDamage")]
    UltimateChargeFromDamage,
    #[strum(serialize = "Effects.UltimateCharge.FromHealing")]
    UltimateChargeFromHealing,
    #[strum(serialize = "Effects.Cooldown")]
    Cooldown,

    // ========================================================================
    // Gameplay events
    // ========================================================================
    #[strum(serialize = "GameplayEvent.Ability.Death")]
    EventDeath,
    #[strum(serialize = "GameplayEvent.Player.Reset")]
    EventReset,
    #[strum(serialize = "GameplayEvent.Ability.MeleeHit")]
    EventMeleeHit,
}

impl GameplayTag {
    /// Single-bit set containing this tag.
    pub const fn bit(self) -> TagSet {
        TagSet::from_bits_retain(1u64 << self as u64)
    }

    /// Engine name of this tag (`"State.Dying"`).
    pub fn name(self) -> &'static str {
        self.into()
    }
}

bitflags! {
    /// Static set of tags, used in ability and effect definitions.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TagSet: u64 {
        const SURVIVES_DEATH = 1 << GameplayTag::AbilitySurvivesDeath as u64;
        const DISABLED = 1 << GameplayTag::AbilityDisabled as u64;
        const ULTIMATE = 1 << GameplayTag::AbilityUltimate as u64;
        const WEAPON = 1 << GameplayTag::AbilityWeapon as u64;
        const DYING = 1 << GameplayTag::StateDying as u64;
        const DEAD = 1 << GameplayTag::StateDead as u64;
        const IMMUNE_TO_DAMAGE = 1 << GameplayTag::StateImmuneToDamage as u64;
        const SPECTATING = 1 << GameplayTag::StateSpectating as u64;
        const INPUT_BLOCKED = 1 << GameplayTag::AbilityInputBlocked as u64;
        const SELF_DESTRUCT = 1 << GameplayTag::DamageSelfDestruct as u64;
        const CAN_DAMAGE_SELF = 1 << GameplayTag::DamageCanDamageSelf as u64;
        const ULTIMATE_FROM_DAMAGE = 1 << GameplayTag::UltimateChargeFromDamage as u64;
        const ULTIMATE_FROM_HEALING = 1 << GameplayTag::UltimateChargeFromHealing as u64;
        const COOLDOWN = 1 << GameplayTag::Cooldown as u64;

        const DEAD_OR_DYING = Self::DYING.bits() | Self::DEAD.bits();
    }
}

impl TagSet {
    /// Iterates over the individual tags in this set.
    pub fn tags(self) -> impl Iterator<Item = GameplayTag> {
        GameplayTag::iter().filter(move |tag| self.contains(tag.bit()))
    }
}

// Text formats read and write flag names (`"DYING | DEAD"`), binary formats
// the raw bits.
#[cfg(feature = "serde")]
impl serde::Serialize for TagSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TagSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

impl From<GameplayTag> for TagSet {
    fn from(tag: GameplayTag) -> Self {
        tag.bit()
    }
}

/// Input tags that drive ability activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(EnumString, AsRefStr, IntoStaticStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputTag {
    #[strum(serialize = "InputTag.Ability.Primary")]
    Primary,
    #[strum(serialize = "InputTag.Ability.Secondary")]
    Secondary,
    #[strum(serialize = "InputTag.Ability.Tertiary")]
    Tertiary,
    #[strum(serialize = "InputTag.Ability.Ultimate")]
    Ultimate,
    #[strum(serialize = "InputTag.Ability.Weapon")]
    Weapon,
    #[strum(serialize = "InputTag.Movement.Jump")]
    Jump,
}

/// Counted tags owned by one ability-owner.
///
/// Several sources can grant the same tag (an effect, an active ability, a
/// loose tag); the tag stays present until every source has removed its count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCountContainer {
    counts: BTreeMap<GameplayTag, u32>,
    present: TagSet,
}

impl TagCountContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` stacks of `tag`.
    pub fn add(&mut self, tag: GameplayTag, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(tag).or_insert(0) += count;
        self.present.insert(tag.bit());
    }

    /// Removes `count` stacks of `tag`; the stack disappears at zero.
    pub fn remove(&mut self, tag: GameplayTag, count: u32) {
        if let Some(current) = self.counts.get_mut(&tag) {
            *current = current.saturating_sub(count);
            if *current == 0 {
                self.counts.remove(&tag);
                self.present.remove(tag.bit());
            }
        }
    }

    /// Overrides the stack count of `tag`.
    pub fn set_count(&mut self, tag: GameplayTag, count: u32) {
        if count == 0 {
            self.counts.remove(&tag);
            self.present.remove(tag.bit());
        } else {
            self.counts.insert(tag, count);
            self.present.insert(tag.bit());
        }
    }

    pub fn add_set(&mut self, tags: TagSet) {
        for tag in tags.tags() {
            self.add(tag, 1);
        }
    }

    pub fn remove_set(&mut self, tags: TagSet) {
        for tag in tags.tags() {
            self.remove(tag, 1);
        }
    }

    pub fn count(&self, tag: GameplayTag) -> u32 {
        self.counts.get(&tag).copied().unwrap_or(0)
    }

    pub fn has(&self, tag: GameplayTag) -> bool {
        self.present.contains(tag.bit())
    }

    pub fn has_any(&self, tags: TagSet) -> bool {
        self.present.intersects(tags)
    }

    pub fn has_all(&self, tags: TagSet) -> bool {
        self.present.contains(tags)
    }

    /// Every tag with a non-zero count.
    pub fn present(&self) -> TagSet {
        self.present
    }
}
