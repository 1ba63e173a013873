//! Ability definition loader.

use std::path::Path;

use gameplay_core::AbilityDef;

use crate::loaders::{LoadResult, read_file};

/// Loader for ability definitions from a RON list.
///
/// Omitted fields take the serde defaults of [`AbilityDef`]; note that
/// `activation_blocked_tags` defaults to empty, so abilities that must not
/// run while dying list `"DYING | DEAD"` explicitly.
pub struct AbilityLoader;

impl AbilityLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilityDef>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilityDef>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse abilities RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::{
        AbilityBehavior, ActivationGroup, GameplayTag, InputTag, MeleeTargeting, MontageId,
        NetExecutionPolicy, TagSet,
    };

    use super::*;

    #[test]
    fn parses_behaviors_and_policies() {
        let abilities = AbilityLoader::parse(
            r#"[
                (
                    id: "ga.death",
                    behavior: Death,
                    net_execution: ServerInitiated,
                    trigger_event: Some(EventDeath),
                    ability_tags: "SURVIVES_DEATH",
                    can_be_cancelled: false,
                ),
                (
                    id: "ga.punch",
                    behavior: MeleeAttack((
                        targeting: Sphere(range: 1.5, radius: 1.0),
                        damage_effect: "ge.damage",
                        montage: Some(MontageId(3)),
                        base_damage: 25.0,
                    )),
                    activation_group: ExclusiveReplaceable,
                    input_tag: Some(Primary),
                    activation_blocked_tags: "DYING | DEAD",
                ),
            ]"#,
        )
        .unwrap();

        let death = &abilities[0];
        assert_eq!(death.behavior, AbilityBehavior::Death);
        assert_eq!(death.net_execution, NetExecutionPolicy::ServerInitiated);
        assert_eq!(death.trigger_event, Some(GameplayTag::EventDeath));
        assert!(!death.can_be_cancelled);

        let punch = &abilities[1];
        assert!(punch.can_be_cancelled);
        assert_eq!(punch.activation_group, ActivationGroup::ExclusiveReplaceable);
        assert_eq!(punch.input_tag, Some(InputTag::Primary));
        assert_eq!(punch.activation_blocked_tags, TagSet::DEAD_OR_DYING);
        let AbilityBehavior::MeleeAttack(melee) = &punch.behavior else {
            panic!("expected a melee behavior");
        };
        assert_eq!(melee.montage, Some(MontageId(3)));
        assert_eq!(melee.targeting, MeleeTargeting::Sphere { range: 1.5, radius: 1.0 });
    }

    #[test]
    fn unknown_behavior_fails_with_context() {
        let err = AbilityLoader::parse(r#"[(id: "ga.x", behavior: Teleport)]"#).unwrap_err();
        assert!(err.to_string().contains("abilities RON"));
    }
}
