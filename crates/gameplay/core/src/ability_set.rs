//! Ability sets: bundles of abilities, effects and attribute sets granted and
//! revoked together.
//!
//! Game features and pawn data grant sets. The returned [`GrantedHandles`] is
//! the only way to take a grant back, so callers keep it for as long as the
//! grant should last.

use crate::ability::{AbilityId, AbilitySpecHandle};
use crate::attribute::AttributeSetKind;
use crate::effect::{ActiveEffectHandle, EffectApplication, EffectId};
use crate::env::GameplayEnv;
use crate::ids::ActorId;
use crate::system::AbilitySystem;
use crate::tags::InputTag;

/// One ability granted by a set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySetGrant {
    pub ability: AbilityId,
    #[cfg_attr(feature = "serde", serde(default = "default_level"))]
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub input_tag: Option<InputTag>,
}

/// One effect applied by a set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySetEffect {
    pub effect: EffectId,
    #[cfg_attr(feature = "serde", serde(default = "default_effect_level"))]
    pub level: f32,
}

#[cfg(feature = "serde")]
fn default_level() -> u32 {
    1
}

#[cfg(feature = "serde")]
fn default_effect_level() -> f32 {
    1.0
}

/// Authored bundle of grants.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySet {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilitySetGrant>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<AbilitySetEffect>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attribute_sets: Vec<AttributeSetKind>,
}

/// What one [`AbilitySet::give_to`] call actually granted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrantedHandles {
    pub abilities: Vec<AbilitySpecHandle>,
    pub effects: Vec<ActiveEffectHandle>,
    pub attribute_sets: Vec<AttributeSetKind>,
}

impl GrantedHandles {
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty() && self.effects.is_empty() && self.attribute_sets.is_empty()
    }
}

impl AbilitySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ability(mut self, ability: impl Into<String>, input_tag: Option<InputTag>) -> Self {
        self.abilities.push(AbilitySetGrant {
            ability: AbilityId::new(ability),
            level: 1,
            input_tag,
        });
        self
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effects.push(AbilitySetEffect {
            effect: EffectId::new(effect),
            level: 1.0,
        });
        self
    }

    pub fn with_attribute_set(mut self, kind: AttributeSetKind) -> Self {
        self.attribute_sets.push(kind);
        self
    }

    /// Grants the whole set to `system` (authority only).
    ///
    /// Attribute sets are registered first so granted effects and passive
    /// abilities see them. Entries whose definitions are missing are logged
    /// and skipped; the rest of the set is still granted. Attribute sets the
    /// owner already had are not recorded, so removing the grant leaves them.
    pub fn give_to(
        &self,
        system: &mut AbilitySystem,
        source: Option<ActorId>,
        env: &GameplayEnv<'_>,
    ) -> Option<GrantedHandles> {
        if !system.role().is_authority() {
            return None;
        }
        let mut granted = GrantedHandles::default();

        for &kind in &self.attribute_sets {
            if system.add_attribute_set(kind) {
                granted.attribute_sets.push(kind);
            }
        }

        for grant in &self.abilities {
            let def = env
                .definitions()
                .ok()
                .and_then(|definitions| definitions.ability(&grant.ability));
            let Some(def) = def else {
                tracing::error!(set = %self.name, ability = %grant.ability, "ability set references an unknown ability");
                continue;
            };
            if let Some(handle) =
                system.give_ability_with_input(def, grant.level, source, grant.input_tag, env)
            {
                granted.abilities.push(handle);
            }
        }

        for entry in &self.effects {
            let applied = system
                .make_outgoing_spec(&entry.effect, entry.level, env)
                .and_then(|spec| system.apply_effect_spec(spec, env));
            match applied {
                Ok(EffectApplication::Applied(handle)) => granted.effects.push(handle),
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(set = %self.name, effect = %entry.effect, %err, "ability set effect not applied");
                }
            }
        }

        tracing::debug!(
            owner = %system.owner(),
            set = %self.name,
            abilities = granted.abilities.len(),
            effects = granted.effects.len(),
            "ability set granted"
        );
        Some(granted)
    }

    /// Revokes a grant made by [`give_to`](Self::give_to) (authority only).
    pub fn remove_from(handles: GrantedHandles, system: &mut AbilitySystem, env: &GameplayEnv<'_>) {
        if !system.role().is_authority() {
            return;
        }
        for handle in handles.abilities {
            system.remove_ability(handle, env);
        }
        for handle in handles.effects {
            system.remove_effect(handle, env);
        }
        for kind in handles.attribute_sets {
            system.remove_attribute_set(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDef, ActivationMethod};
    use crate::attribute::{Attribute, HealthBaseValues, ModOp};
    use crate::config::GameplayConfig;
    use crate::effect::{EffectDef, Magnitude};
    use crate::net::NetRole;
    use crate::system::test_support::{OWNER, World, server};

    fn world() -> World {
        let mut world = World::new();
        world
            .definitions
            .insert_ability(AbilityDef::new("ga.jab").with_input(InputTag::Primary));
        world.definitions.insert_ability(
            AbilityDef::new("ga.aura").with_activation_method(ActivationMethod::Passive),
        );
        world.definitions.insert_effect(
            EffectDef::infinite("ge.sturdy").with_modifier(
                Attribute::DamageResistance,
                ModOp::Add,
                Magnitude::flat(0.25),
            ),
        );
        world
    }

    fn set() -> AbilitySet {
        AbilitySet::new("as.brawler")
            .with_ability("ga.jab", Some(InputTag::Secondary))
            .with_ability("ga.aura", None)
            .with_effect("ge.sturdy")
            .with_attribute_set(AttributeSetKind::Movement)
    }

    #[test]
    fn grant_and_revoke_round_trip() {
        let world = world();
        let env = world.env();
        let mut system = server(&world);

        let handles = set().give_to(&mut system, None, &env).unwrap();
        assert_eq!(handles.abilities.len(), 2);
        assert_eq!(handles.effects.len(), 1);
        assert_eq!(handles.attribute_sets, vec![AttributeSetKind::Movement]);

        let jab = system.spec(handles.abilities[0]).unwrap();
        assert_eq!(jab.input_tag, Some(InputTag::Secondary));
        assert!(system.is_active(handles.abilities[1]));
        assert_eq!(system.attribute(Attribute::DamageResistance), 0.25);

        AbilitySet::remove_from(handles, &mut system, &env);
        assert_eq!(system.specs().count(), 0);
        assert!(system.effects().is_empty());
        assert_eq!(system.attribute(Attribute::DamageResistance), 0.0);
        assert!(!system.attributes().has_set(AttributeSetKind::Movement));
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let world = world();
        let env = world.env();
        let mut system = server(&world);
        let handles = AbilitySet::new("as.broken")
            .with_ability("ga.missing", None)
            .with_ability("ga.jab", None)
            .with_effect("ge.missing")
            .give_to(&mut system, None, &env)
            .unwrap();
        assert_eq!(handles.abilities.len(), 1);
        assert!(handles.effects.is_empty());
    }

    #[test]
    fn existing_attribute_sets_survive_revoke() {
        let world = world();
        let env = world.env();
        let mut system = server(&world);
        let handles = AbilitySet::new("as.health")
            .with_attribute_set(AttributeSetKind::Health)
            .give_to(&mut system, None, &env)
            .unwrap();
        assert!(handles.is_empty());
        AbilitySet::remove_from(handles, &mut system, &env);
        assert!(system.attributes().has_set(AttributeSetKind::Health));
    }

    #[test]
    fn clients_cannot_grant() {
        let world = world();
        let env = world.env();
        let mut system = AbilitySystem::new(OWNER, NetRole::AutonomousProxy, GameplayConfig::default());
        system.init_health(HealthBaseValues::default(), &env);
        assert!(set().give_to(&mut system, None, &env).is_none());
        assert_eq!(system.specs().count(), 0);
        assert!(!system.attributes().has_set(AttributeSetKind::Movement));
    }
}
