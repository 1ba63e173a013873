//! Authored data shapes that sit above the core definitions.
//!
//! Effect and ability definitions are the core types themselves; this module
//! adds the pawn and game-mode records that tie them together, and the
//! [`ContentBundle`] a session is built from.

use std::collections::BTreeMap;

use gameplay_core::{
    AbilityBehavior, AbilityDef, AbilitySet, AttributeSetKind, DefinitionOracle, DefinitionTable,
    EffectId, GameModeProperties, GameplayConfig, HealthBaseValues,
};

use crate::error::ContentError;

// ============================================================================
// Pawns
// ============================================================================

/// Everything needed to set up one kind of pawn.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PawnData {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub health: HealthBaseValues,
    /// Sets registered on the pawn's store besides the health set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attribute_sets: Vec<AttributeSetKind>,
    /// Ability sets granted when the pawn's data becomes available.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_sets: Vec<String>,
}

impl PawnData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: HealthBaseValues::default(),
            attribute_sets: Vec::new(),
            ability_sets: Vec::new(),
        }
    }

    pub fn with_health(mut self, health: HealthBaseValues) -> Self {
        self.health = health;
        self
    }

    pub fn with_ability_set(mut self, set: impl Into<String>) -> Self {
        self.ability_sets.push(set.into());
        self
    }
}

// ============================================================================
// Game modes
// ============================================================================

/// A bundle of ability sets a game mode switches on for every player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameFeatureData {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ability_sets: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameModeData {
    pub name: String,
    pub default_pawn: String,
    #[cfg_attr(feature = "serde", serde(default = "default_team_count"))]
    pub team_count: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: GameModeProperties,
    /// Activated in order when the mode starts, deactivated in reverse.
    #[cfg_attr(feature = "serde", serde(default))]
    pub features: Vec<GameFeatureData>,
}

#[cfg(feature = "serde")]
fn default_team_count() -> u8 {
    2
}

impl GameModeData {
    pub fn new(name: impl Into<String>, default_pawn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_pawn: default_pawn.into(),
            team_count: 2,
            properties: GameModeProperties::new(),
            features: Vec::new(),
        }
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// All content a session needs, loaded and cross-checked.
#[derive(Clone, Debug)]
pub struct ContentBundle {
    pub config: GameplayConfig,
    pub definitions: DefinitionTable,
    pub ability_sets: BTreeMap<String, AbilitySet>,
    pub pawns: BTreeMap<String, PawnData>,
    pub game_mode: GameModeData,
}

impl ContentBundle {
    pub fn ability_set(&self, name: &str) -> Option<&AbilitySet> {
        self.ability_sets.get(name)
    }

    pub fn pawn(&self, name: &str) -> Option<&PawnData> {
        self.pawns.get(name)
    }

    pub fn default_pawn(&self) -> Option<&PawnData> {
        self.pawn(&self.game_mode.default_pawn)
    }

    /// Checks every cross reference and returns the first dangling one.
    pub fn validate(&self) -> Result<(), ContentError> {
        for ability in self.definitions.abilities() {
            for effect in referenced_effects(ability) {
                self.require_effect(ability.id.as_str(), effect)?;
            }
        }

        for set in self.ability_sets.values() {
            for grant in &set.abilities {
                if self.definitions.ability(&grant.ability).is_none() {
                    return Err(ContentError::UnknownAbility {
                        referrer: set.name.clone(),
                        ability: grant.ability.clone(),
                    });
                }
            }
            for grant in &set.effects {
                self.require_effect(&set.name, &grant.effect)?;
            }
        }

        for pawn in self.pawns.values() {
            for set in &pawn.ability_sets {
                self.require_ability_set(&pawn.name, set)?;
            }
        }

        let mode = &self.game_mode;
        if mode.team_count == 0 {
            return Err(ContentError::NoTeams {
                mode: mode.name.clone(),
            });
        }
        if !self.pawns.contains_key(&mode.default_pawn) {
            return Err(ContentError::UnknownPawn {
                mode: mode.name.clone(),
                pawn: mode.default_pawn.clone(),
            });
        }
        for feature in &mode.features {
            for set in &feature.ability_sets {
                self.require_ability_set(&feature.name, set)?;
            }
        }
        Ok(())
    }

    fn require_effect(&self, referrer: &str, effect: &EffectId) -> Result<(), ContentError> {
        if self.definitions.effect(effect).is_some() {
            return Ok(());
        }
        Err(ContentError::UnknownEffect {
            referrer: referrer.to_owned(),
            effect: effect.clone(),
        })
    }

    fn require_ability_set(&self, referrer: &str, set: &str) -> Result<(), ContentError> {
        if self.ability_sets.contains_key(set) {
            return Ok(());
        }
        Err(ContentError::UnknownAbilitySet {
            referrer: referrer.to_owned(),
            set: set.to_owned(),
        })
    }
}

fn referenced_effects(ability: &AbilityDef) -> impl Iterator<Item = &EffectId> {
    let cooldown = ability.cooldown.as_ref().map(|cooldown| &cooldown.effect);
    let melee = match &ability.behavior {
        AbilityBehavior::MeleeAttack(melee) => Some(&melee.damage_effect),
        _ => None,
    };
    cooldown
        .into_iter()
        .chain(melee)
        .chain(&ability.ongoing_effects)
        .chain(&ability.ongoing_effects_removed_on_end)
}

#[cfg(test)]
mod tests {
    use gameplay_core::{AbilityId, AbilitySetGrant, CooldownConfig, EffectDef};

    use super::*;

    fn bundle() -> ContentBundle {
        let mut definitions = DefinitionTable::new();
        definitions.insert_effect(EffectDef::instant("ge.damage"));
        definitions.insert_ability(AbilityDef::death("ga.death"));

        let mut ability_sets = BTreeMap::new();
        ability_sets.insert(
            "as.core".to_owned(),
            AbilitySet::new("as.core").with_ability("ga.death", None),
        );
        let mut pawns = BTreeMap::new();
        pawns.insert("hero".to_owned(), PawnData::new("hero").with_ability_set("as.core"));

        ContentBundle {
            config: GameplayConfig::default(),
            definitions,
            ability_sets,
            pawns,
            game_mode: GameModeData::new("elimination", "hero"),
        }
    }

    #[test]
    fn consistent_bundle_validates() {
        let bundle = bundle();
        assert_eq!(bundle.validate(), Ok(()));
        assert_eq!(bundle.default_pawn().map(|p| p.name.as_str()), Some("hero"));
    }

    #[test]
    fn dangling_cooldown_effect_is_reported() {
        let mut bundle = bundle();
        bundle
            .definitions
            .insert_ability(AbilityDef::new("ga.dash").with_cooldown(CooldownConfig::new("ge.missing")));
        assert_eq!(
            bundle.validate(),
            Err(ContentError::UnknownEffect {
                referrer: "ga.dash".to_owned(),
                effect: EffectId::new("ge.missing"),
            })
        );
    }

    #[test]
    fn dangling_set_entries_are_reported() {
        let mut bundle = bundle();
        bundle.ability_sets.get_mut("as.core").unwrap().abilities.push(AbilitySetGrant {
            ability: AbilityId::new("ga.nope"),
            level: 1,
            input_tag: None,
        });
        assert!(matches!(
            bundle.validate(),
            Err(ContentError::UnknownAbility { referrer, .. }) if referrer == "as.core"
        ));

        let mut bundle = self::bundle();
        bundle.game_mode.features.push(GameFeatureData {
            name: "feature.weapons".to_owned(),
            ability_sets: vec!["as.weapons".to_owned()],
        });
        assert!(matches!(
            bundle.validate(),
            Err(ContentError::UnknownAbilitySet { set, .. }) if set == "as.weapons"
        ));
    }

    #[test]
    fn game_mode_needs_a_known_pawn_and_teams() {
        let mut bundle = bundle();
        bundle.game_mode.default_pawn = "ghost".to_owned();
        assert!(matches!(bundle.validate(), Err(ContentError::UnknownPawn { .. })));

        let mut bundle = self::bundle();
        bundle.game_mode.team_count = 0;
        assert!(matches!(bundle.validate(), Err(ContentError::NoTeams { .. })));
    }
}
