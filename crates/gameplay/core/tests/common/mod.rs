//! Shared world setup for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use gameplay_core::{
    AbilityDef, AbilityId, AbilitySystem, ActorId, DefinitionOracle, DefinitionTable, EffectDef,
    ExecutionKind, GameModeProperties, GameModeProperty, GameplayConfig, GameplayEnv,
    HealthBaseValues, Magnitude, NetRole, SetByCallerKey, SpatialTable, TagSet, TeamId, TeamTable,
};

pub const HERO: ActorId = ActorId(1);
pub const ALLY: ActorId = ActorId(2);
pub const FOE: ActorId = ActorId(3);

pub struct World {
    pub definitions: DefinitionTable,
    pub teams: TeamTable,
    pub mode: GameModeProperties,
    pub spatial: SpatialTable,
}

impl World {
    pub fn new() -> Self {
        let mut definitions = DefinitionTable::new();
        definitions.insert_effect(EffectDef::instant("ge.damage").with_execution(
            ExecutionKind::Damage,
            Magnitude::SetByCaller(SetByCallerKey::Damage),
        ));
        definitions.insert_effect(EffectDef::instant("ge.heal").with_execution(
            ExecutionKind::Healing,
            Magnitude::SetByCaller(SetByCallerKey::Healing),
        ));
        definitions.insert_effect(
            EffectDef::timed("ge.cooldown", Magnitude::SetByCaller(SetByCallerKey::Duration))
                .with_granted_tags(TagSet::COOLDOWN),
        );
        definitions.insert_ability(AbilityDef::death("ga.death"));
        definitions.insert_ability(AbilityDef::reset("ga.reset"));
        definitions.insert_ability(AbilityDef::auto_respawn("ga.respawn"));
        Self {
            definitions,
            teams: TeamTable::new()
                .with_member(HERO, TeamId(0))
                .with_member(ALLY, TeamId(0))
                .with_member(FOE, TeamId(1)),
            mode: GameModeProperties::new()
                .with(GameModeProperty::RespawnTime, 3.0)
                .with(GameModeProperty::DeathDuration, 1.0),
            spatial: SpatialTable::new(),
        }
    }

    pub fn env(&self) -> GameplayEnv<'_> {
        GameplayEnv::with_all(&self.definitions, &self.teams, &self.mode, &self.spatial)
    }

    pub fn ability(&self, id: &str) -> Arc<AbilityDef> {
        self.definitions
            .ability(&AbilityId::new(id))
            .expect("ability registered in the test world")
    }
}

/// A ready system for `owner` with full health.
pub fn system(world: &World, owner: ActorId, role: NetRole) -> AbilitySystem {
    let env = world.env();
    let mut system = AbilitySystem::new(owner, role, GameplayConfig::default());
    system.init_health(HealthBaseValues::default(), &env);
    system.set_avatar(Some(owner), &env);
    system.set_gameplay_ready(true, &env);
    system
}

/// Delivers queued requests between one owner's server and client copies
/// until both queues are empty.
pub fn pump(server: &mut AbilitySystem, client: &mut AbilitySystem, env: &GameplayEnv<'_>) {
    loop {
        let to_client = server.drain_requests();
        let to_server = client.drain_requests();
        if to_client.is_empty() && to_server.is_empty() {
            break;
        }
        for request in to_client {
            client.receive(request, env);
        }
        for request in to_server {
            server.receive(request, env);
        }
    }
}
