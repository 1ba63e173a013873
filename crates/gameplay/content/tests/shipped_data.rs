use std::path::PathBuf;

use gameplay_content::ContentFactory;
use gameplay_core::{
    AbilityId, AbilitySystem, ActorId, Attribute, AttributeSetKind, DefinitionOracle,
    GameModeOracle, GameModeProperty, GameplayEnv, InputTag, NetRole, SpatialTable, TeamId,
    TeamTable,
};

fn factory() -> ContentFactory {
    ContentFactory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"))
}

#[test]
fn every_shipped_game_mode_loads_and_validates() {
    for mode in ["elimination", "practice"] {
        let bundle = factory()
            .load_bundle(mode)
            .unwrap_or_else(|err| panic!("{mode}: {err:#}"));
        assert_eq!(bundle.game_mode.name, mode);
        assert!(bundle.default_pawn().is_some());
    }
}

#[test]
fn elimination_properties_reach_the_oracle() {
    let bundle = factory().load_bundle("elimination").unwrap();
    let properties = &bundle.game_mode.properties;
    assert_eq!(properties.property(GameModeProperty::StartingLives), Some(3.0));
    assert_eq!(properties.property(GameModeProperty::RespawnTime), Some(5.0));
    assert_eq!(bundle.config.default_respawn_time, 5.0);
    assert!(
        bundle
            .definitions
            .ability(&AbilityId::new("ga.death"))
            .is_some_and(|death| !death.can_be_cancelled)
    );
}

#[test]
fn hero_pawn_kit_is_grantable_and_playable() {
    let bundle = factory().load_bundle("elimination").unwrap();
    let hero = ActorId(1);
    let teams = TeamTable::new().with_member(hero, TeamId(0));
    let spatial = SpatialTable::new();
    let env = GameplayEnv::with_all(
        &bundle.definitions,
        &teams,
        &bundle.game_mode.properties,
        &spatial,
    );

    let pawn = bundle.default_pawn().unwrap();
    let mut system = AbilitySystem::new(hero, NetRole::Authority, bundle.config.clone());
    system.init_health(pawn.health, &env);
    for &kind in &pawn.attribute_sets {
        system.add_attribute_set(kind);
    }
    let mut grants = Vec::new();
    for name in pawn
        .ability_sets
        .iter()
        .chain(&bundle.game_mode.features[0].ability_sets)
    {
        let set = bundle.ability_set(name).unwrap();
        grants.push(set.give_to(&mut system, Some(hero), &env).unwrap());
    }
    system.set_avatar(Some(hero), &env);
    system.set_gameplay_ready(true, &env);

    assert!(system.attributes().has_set(AttributeSetKind::Ultimate));
    assert_eq!(system.attributes().ultimate_charge_cap(), 100.0);
    assert_eq!(system.attribute(Attribute::Health), 100.0);

    let dash = system.find_ability(&AbilityId::new("ga.dash")).unwrap();
    system.ability_input_pressed(InputTag::Secondary);
    system.process_input(&env);
    assert!(system.is_active(dash));
    system.tick(0.5, &env);
    assert!(!system.is_active(dash));
    assert_eq!(system.cooldown_remaining(dash), Some(3.5));

    // Revoking the ultimates feature takes the ultimate and its set away again.
    let ultimates = grants.pop().unwrap();
    gameplay_core::AbilitySet::remove_from(ultimates, &mut system, &env);
    assert!(system.find_ability(&AbilityId::new("ga.ultimate")).is_none());
    assert!(!system.attributes().has_set(AttributeSetKind::Ultimate));
}
