mod common;

use common::{FOE, HERO, World, system};
use gameplay_core::{
    AbilitySystem, Attribute, EffectDef, EffectId, EffectSpec, ExecutionKind, GameplayEnv,
    GameplayTag, HealthBaseValues, Magnitude, MessageKind, NetRole, SetByCallerKey, TagSet,
};

fn damage_spec(
    source: &AbilitySystem,
    effect: &str,
    amount: f32,
    env: &GameplayEnv<'_>,
) -> EffectSpec {
    let mut spec = source
        .make_outgoing_spec(&EffectId::new(effect), 1.0, env)
        .unwrap();
    spec.set_set_by_caller(SetByCallerKey::Damage, amount);
    spec
}

fn out_of_health_count(target: &mut AbilitySystem) -> usize {
    target
        .drain_messages()
        .into_iter()
        .filter(|m| matches!(m.kind, MessageKind::OutOfHealth { .. }))
        .count()
}

#[test]
fn overkill_stops_at_zero_health_and_reports_once() {
    let world = World::new();
    let env = world.env();
    let hero = system(&world, HERO, NetRole::Authority);
    let mut foe = system(&world, FOE, NetRole::Authority);
    foe.init_health(
        HealthBaseValues {
            max_health: 50.0,
            health: 50.0,
            overhealth: 0.0,
        },
        &env,
    );
    foe.drain_messages();

    foe.apply_effect_spec(damage_spec(&hero, "ge.damage", 1000.0, &env), &env)
        .unwrap();

    assert_eq!(foe.attribute(Attribute::Health), 0.0);
    assert_eq!(foe.attribute(Attribute::Overhealth), 0.0);
    assert_eq!(foe.attribute(Attribute::Damage), 0.0);
    assert_eq!(out_of_health_count(&mut foe), 1);

    // Already empty: a second hit changes nothing and does not report again.
    foe.apply_effect_spec(damage_spec(&hero, "ge.damage", 10.0, &env), &env)
        .unwrap();
    assert_eq!(foe.attribute(Attribute::Health), 0.0);
    assert_eq!(out_of_health_count(&mut foe), 0);
}

#[test]
fn self_destruct_gets_through_damage_immunity() {
    let mut world = World::new();
    world.definitions.insert_effect(
        EffectDef::instant("ge.self_destruct")
            .with_execution(
                ExecutionKind::Damage,
                Magnitude::SetByCaller(SetByCallerKey::Damage),
            )
            .with_asset_tags(TagSet::SELF_DESTRUCT),
    );
    let env = world.env();
    let hero = system(&world, HERO, NetRole::Authority);
    let mut foe = system(&world, FOE, NetRole::Authority);
    foe.add_loose_tag(GameplayTag::StateImmuneToDamage);

    foe.apply_effect_spec(damage_spec(&hero, "ge.damage", 40.0, &env), &env)
        .unwrap();
    assert_eq!(foe.attribute(Attribute::Health), 100.0);

    foe.apply_effect_spec(damage_spec(&hero, "ge.self_destruct", 40.0, &env), &env)
        .unwrap();
    assert_eq!(foe.attribute(Attribute::Health), 60.0);
    assert_eq!(foe.attribute(Attribute::Damage), 0.0);
}
