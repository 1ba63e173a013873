mod common;

use common::{ALLY, FOE, HERO, World, pump, system};
use gameplay_core::{
    AbilityBehavior, AbilityDef, ActorId, Attribute, AvatarTransform, EffectId, GameplayEventData,
    GameplayTag, MeleeAttackDef, MeleeTargeting, MessageKind, MontageId, NetExecutionPolicy,
    NetRequest, NetRole, Outbound,
};
use glam::Vec3;

fn melee_world() -> World {
    let mut world = World::new();
    world.definitions.insert_ability(
        AbilityDef::new("ga.punch").with_behavior(AbilityBehavior::MeleeAttack(MeleeAttackDef {
            targeting: MeleeTargeting::Sphere {
                range: 1.5,
                radius: 1.5,
            },
            damage_effect: EffectId::new("ge.damage"),
            montage: Some(MontageId(3)),
            base_damage: 25.0,
        })),
    );
    world.definitions.insert_ability(
        AbilityDef::new("ga.taunt").with_net_execution(NetExecutionPolicy::ServerInitiated),
    );
    world.spatial.place(HERO, AvatarTransform::new(Vec3::ZERO, Vec3::X));
    world.spatial.place(ALLY, AvatarTransform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::X));
    world.spatial.place(FOE, AvatarTransform::new(Vec3::new(2.0, 0.5, 0.0), Vec3::NEG_X));
    world.spatial.place(ActorId(9), AvatarTransform::new(Vec3::new(40.0, 0.0, 0.0), Vec3::X));
    world
}

#[test]
fn predicted_swing_is_confirmed_and_damage_lands_through_the_server() {
    let world = melee_world();
    let env = world.env();
    let mut server = system(&world, HERO, NetRole::Authority);
    let mut client = system(&world, HERO, NetRole::AutonomousProxy);
    let mut foe = system(&world, FOE, NetRole::Authority);

    let punch = server
        .give_ability(world.ability("ga.punch"), 1, None, &env)
        .unwrap();
    pump(&mut server, &mut client, &env);
    assert!(client.spec(punch).is_some());

    client.try_activate(punch, &env).unwrap();
    assert!(client.is_active(punch));
    assert_eq!(client.prediction().pending_count(), 1);

    pump(&mut server, &mut client, &env);
    assert_eq!(client.prediction().pending_count(), 0);
    let waiting = server.spec(punch).unwrap();
    assert!(waiting.instance.awaits_target_data());

    // The animation reaches its hit frame on the client.
    let hit = GameplayEventData::from_instigator(Some(HERO), 0.0);
    client.handle_gameplay_event(GameplayTag::EventMeleeHit, hit, &env);
    assert!(!client.is_active(punch));
    assert!(client.drain_outbound().is_empty(), "clients never apply damage");

    pump(&mut server, &mut client, &env);
    assert!(!server.is_active(punch));
    let outbound = server.drain_outbound();
    assert_eq!(outbound.len(), 1);
    let Outbound::ApplyEffect { target, spec } = outbound.into_iter().next().unwrap() else {
        panic!("expected a damage effect");
    };
    assert_eq!(target, FOE);
    foe.apply_effect_spec(spec, &env).unwrap();
    assert_eq!(foe.attribute(Attribute::Health), 75.0);

    let client_messages: Vec<_> = client.drain_messages().into_iter().map(|m| m.kind).collect();
    assert!(client_messages.iter().any(|m| matches!(m, MessageKind::MontagePlayed { montage: MontageId(3), .. })));
    assert!(!client_messages.iter().any(|m| matches!(m, MessageKind::AbilityEnded { cancelled: true, .. })));
}

#[test]
fn server_drops_targets_it_cannot_confirm() {
    let world = melee_world();
    let env = world.env();
    let mut server = system(&world, HERO, NetRole::Authority);
    let mut client = system(&world, HERO, NetRole::AutonomousProxy);
    let punch = server
        .give_ability(world.ability("ga.punch"), 1, None, &env)
        .unwrap();
    pump(&mut server, &mut client, &env);
    client.try_activate(punch, &env).unwrap();
    pump(&mut server, &mut client, &env);

    let key = client.spec(punch).unwrap().instance.activation_key;
    server.receive(
        NetRequest::ServerSetTargetData {
            handle: punch,
            key,
            targets: vec![FOE, ALLY, ActorId(9)],
        },
        &env,
    );
    let targets: Vec<_> = server
        .drain_outbound()
        .into_iter()
        .filter_map(|work| match work {
            Outbound::ApplyEffect { target, .. } => Some(target),
            Outbound::GrantUltimateCharge { .. } => None,
        })
        .collect();
    assert_eq!(targets, vec![FOE]);
}

#[test]
fn server_initiated_ability_is_requested_then_mirrored() {
    let world = melee_world();
    let env = world.env();
    let mut server = system(&world, HERO, NetRole::Authority);
    let mut client = system(&world, HERO, NetRole::AutonomousProxy);
    let taunt = server
        .give_ability(world.ability("ga.taunt"), 1, None, &env)
        .unwrap();
    pump(&mut server, &mut client, &env);

    client.try_activate(taunt, &env).unwrap();
    assert!(!client.is_active(taunt), "server-started abilities are not predicted");
    pump(&mut server, &mut client, &env);
    assert!(server.is_active(taunt));
    assert!(client.is_active(taunt));

    server.end_ability(taunt, &env);
    pump(&mut server, &mut client, &env);
    assert!(!client.is_active(taunt));
}

#[test]
fn replicated_attributes_reach_the_client() {
    let world = World::new();
    let env = world.env();
    let mut server = system(&world, HERO, NetRole::Authority);
    let mut client = system(&world, HERO, NetRole::AutonomousProxy);

    server.set_attribute_base(Attribute::Health, 40.0, &env);
    assert!(!client.set_attribute_base(Attribute::Health, 1.0, &env));
    client.apply_replicated_state(&server.replicated_state(), &env);
    assert_eq!(client.attribute(Attribute::Health), 40.0);
    assert!(client.drain_messages().iter().any(|m| matches!(
        m.kind,
        MessageKind::AttributeChanged { attribute: Attribute::Health, new, .. } if new == 40.0
    )));
}
