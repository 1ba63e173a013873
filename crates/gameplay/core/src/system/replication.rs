//! State replication and the request protocol between an owner's server and
//! client copies.

use crate::ability::{AbilitySpecHandle, GameplayEventData};
use crate::attribute::AttributeSnapshot;
use crate::env::GameplayEnv;
use crate::health::{DeathState, ReplicatedDeathState};
use crate::net::{NetExecutionPolicy, NetRequest, NetRole};
use crate::prediction::{PredictionKey, RollbackAction, ScopedPredictionWindow};
use crate::tags::GameplayTag;

use super::AbilitySystem;
use super::activation::Activation;

/// Server state pushed to the owner's other copies.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicatedState {
    pub attributes: AttributeSnapshot,
    pub death: ReplicatedDeathState,
}

impl AbilitySystem {
    pub fn replicated_state(&self) -> ReplicatedState {
        ReplicatedState {
            attributes: self.attributes.snapshot(),
            death: self.health.replicated(),
        }
    }

    /// Takes the server's attribute values and reconciles the death state.
    pub fn apply_replicated_state(&mut self, state: &ReplicatedState, env: &GameplayEnv<'_>) {
        if self.role.is_authority() {
            tracing::warn!(owner = %self.owner, "authority ignores replicated state");
            return;
        }
        self.attributes.apply_replicated(&state.attributes);
        for transition in self.health.reconcile(state.death, &mut self.tags) {
            self.on_death_transition(transition, env);
        }
        self.flush(env);
    }

    /// Handles a request from this owner's copy on the other machine.
    pub fn receive(&mut self, request: NetRequest, env: &GameplayEnv<'_>) {
        let expected = match self.role {
            NetRole::Authority => request.is_server_bound(),
            NetRole::AutonomousProxy => !request.is_server_bound(),
            NetRole::SimulatedProxy => false,
        };
        if !expected {
            tracing::warn!(owner = %self.owner, role = ?self.role, request = request.as_str(), "request sent to the wrong side");
            return;
        }
        tracing::trace!(owner = %self.owner, request = request.as_str(), "received net request");

        match request {
            NetRequest::ServerTryActivate {
                handle,
                key,
                payload,
            } => self.server_try_activate(handle, key, payload, env),
            NetRequest::ServerEndAbility { handle, cancelled } => {
                let predicted = self
                    .spec(handle)
                    .is_some_and(|spec| spec.def.net_execution == NetExecutionPolicy::LocalPredicted);
                if predicted {
                    self.end_internal(handle, false, cancelled, env);
                }
            }
            NetRequest::ServerSetTargetData {
                handle, targets, ..
            } => self.receive_target_data(handle, targets, env),
            NetRequest::ClientGiveAbility {
                handle,
                ability,
                level,
                input_tag,
            } => self.mirror_ability(handle, &ability, level, input_tag, env),
            NetRequest::ClientRemoveAbility { handle } => self.drop_spec(handle, env),
            NetRequest::ClientActivateAbility {
                handle,
                key,
                payload,
            } => self.client_activate(handle, key, payload, env),
            NetRequest::ClientKeyVerdict { key, accepted } => {
                self.client_key_verdict(key, accepted, env);
            }
            NetRequest::ClientEndAbility { handle, cancelled } => {
                if self.is_active(handle) {
                    self.end_internal(handle, false, cancelled, env);
                }
            }
            NetRequest::ClientResetAvatar { generation } => self.client_reset(generation, env),
        }
        self.flush(env);
    }

    fn server_try_activate(
        &mut self,
        handle: AbilitySpecHandle,
        key: Option<PredictionKey>,
        payload: Option<GameplayEventData>,
        env: &GameplayEnv<'_>,
    ) {
        let Some(key) = key else {
            if let Err(failure) = self.try_activate_internal(handle, payload, env) {
                tracing::debug!(owner = %self.owner, %handle, %failure, "client request refused");
            }
            return;
        };

        let mut window = ScopedPredictionWindow::with_key(self, key);
        let accepted = match window.can_activate(handle) {
            Ok(()) => {
                window.activate(
                    handle,
                    Activation {
                        key: Some(key),
                        payload,
                        commit: true,
                    },
                    env,
                );
                true
            }
            Err(failure) => {
                tracing::debug!(owner = %window.owner, %handle, %key, %failure, "rejecting client prediction");
                false
            }
        };
        window.send(NetRequest::ClientKeyVerdict { key, accepted });
    }

    fn client_activate(
        &mut self,
        handle: AbilitySpecHandle,
        key: PredictionKey,
        payload: Option<GameplayEventData>,
        env: &GameplayEnv<'_>,
    ) {
        let Some(spec) = self.spec(handle) else {
            tracing::debug!(owner = %self.owner, %handle, "server activated an ability this client does not know");
            return;
        };
        // Already running: this client predicted it.
        if spec.is_active() {
            return;
        }
        let mut window = ScopedPredictionWindow::with_key(self, key);
        window.activate(
            handle,
            Activation {
                key: Some(key),
                payload,
                commit: false,
            },
            env,
        );
    }

    fn client_key_verdict(&mut self, key: PredictionKey, accepted: bool, env: &GameplayEnv<'_>) {
        if accepted {
            if self.prediction.confirm(key) {
                self.effects.confirm_prediction(key);
            }
            return;
        }

        let rollbacks = self.prediction.reject(key);
        self.drop_rejected_effects();
        for rollback in rollbacks {
            let current = self
                .spec(rollback.ability())
                .is_some_and(|spec| spec.instance.activation_key == Some(rollback.activation()));
            if !current {
                tracing::trace!(owner = %self.owner, ?rollback, "rollback outlived its activation");
                continue;
            }
            match rollback {
                RollbackAction::StopMontage {
                    ability, montage, ..
                } => {
                    let playing = self
                        .spec(ability)
                        .is_some_and(|spec| spec.instance.montage == Some(montage));
                    if playing {
                        self.stop_montage(ability);
                    }
                }
                RollbackAction::EndAbility { ability, .. } => {
                    self.end_internal(ability, false, true, env);
                }
            }
        }
    }

    fn client_reset(&mut self, generation: u32, env: &GameplayEnv<'_>) {
        if generation <= self.health.generation() {
            tracing::debug!(owner = %self.owner, generation, local = self.health.generation(), "stale reset");
            return;
        }
        let server = ReplicatedDeathState {
            generation,
            state: DeathState::NotDead,
        };
        for transition in self.health.reconcile(server, &mut self.tags) {
            self.on_death_transition(transition, env);
        }
        self.tags.set_count(GameplayTag::StateSpectating, 0);
        self.write_health_base();
        self.after_reset(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityBehavior, AbilityDef};
    use crate::attribute::Attribute;
    use crate::effect::EffectDef;
    use crate::ids::MontageId;
    use crate::message::MessageKind;
    use crate::system::test_support::{World, client, server};
    use crate::tags::TagSet;

    /// Delivers queued requests both ways until nothing is left.
    fn pump(server: &mut AbilitySystem, client: &mut AbilitySystem, env: &GameplayEnv<'_>) {
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

    fn guarded_def() -> AbilityDef {
        AbilityDef::new("ga.guard")
            .with_behavior(AbilityBehavior::Generic {
                duration: None,
                montage: Some(MontageId(7)),
            })
            .with_blocked_tags(TagSet::WEAPON)
            .with_ongoing_effect("ge.guard")
    }

    fn world() -> World {
        let mut world = World::new();
        world
            .definitions
            .insert_effect(EffectDef::infinite("ge.guard").with_granted_tags(TagSet::IMMUNE_TO_DAMAGE));
        world.definitions.insert_ability(guarded_def());
        world
    }

    #[test]
    fn confirmed_prediction_keeps_local_work() {
        let world = world();
        let env = world.env();
        let mut server = server(&world);
        let mut client = client(&world);
        let handle = server
            .give_ability(world.ability("ga.guard"), 1, None, &env)
            .unwrap();
        pump(&mut server, &mut client, &env);
        assert!(client.spec(handle).is_some());

        client.try_activate(handle, &env).unwrap();
        assert!(client.is_active(handle));
        assert_eq!(client.effects().len(), 1);
        assert!(client.effects().iter().all(|effect| effect.is_predicted()));

        pump(&mut server, &mut client, &env);
        assert!(server.is_active(handle));
        assert_eq!(client.prediction().pending_count(), 0);
        assert!(client.is_active(handle));
        assert!(client.effects().iter().all(|effect| !effect.is_predicted()));
    }

    #[test]
    fn rejected_prediction_rolls_back() {
        let world = world();
        let env = world.env();
        let mut server = server(&world);
        let mut client = client(&world);
        let handle = server
            .give_ability(world.ability("ga.guard"), 1, None, &env)
            .unwrap();
        pump(&mut server, &mut client, &env);
        server.add_loose_tag(GameplayTag::AbilityWeapon);

        client.try_activate(handle, &env).unwrap();
        client.drain_messages();
        pump(&mut server, &mut client, &env);

        assert!(!server.is_active(handle));
        assert!(!client.is_active(handle));
        assert!(client.effects().is_empty());
        assert!(!client.tags().has(GameplayTag::StateImmuneToDamage));
        let messages: Vec<_> = client.drain_messages().into_iter().map(|m| m.kind).collect();
        assert!(messages.iter().any(|m| matches!(
            m,
            MessageKind::MontageStopped {
                montage: MontageId(7),
                ..
            }
        )));
        assert!(messages.iter().any(|m| matches!(
            m,
            MessageKind::AbilityEnded {
                cancelled: true,
                ..
            }
        )));
    }

    #[test]
    fn late_rejection_leaves_a_newer_activation_alone() {
        let world = world();
        let env = world.env();
        let mut server = server(&world);
        let mut client = client(&world);
        let handle = server
            .give_ability(world.ability("ga.guard"), 1, None, &env)
            .unwrap();
        pump(&mut server, &mut client, &env);

        // First attempt: the server still holds the blocking tag.
        server.add_loose_tag(GameplayTag::AbilityWeapon);
        client.try_activate(handle, &env).unwrap();
        client.end_ability(handle, &env);
        for request in client.drain_requests() {
            server.receive(request, &env);
        }
        assert!(!server.is_active(handle));

        // Second attempt is sent before the first verdict comes back.
        server.remove_loose_tag(GameplayTag::AbilityWeapon);
        client.try_activate(handle, &env).unwrap();
        for request in client.drain_requests() {
            server.receive(request, &env);
        }
        assert!(server.is_active(handle));
        client.drain_messages();

        for request in server.drain_requests() {
            client.receive(request, &env);
        }
        assert_eq!(client.prediction().pending_count(), 0);
        assert!(client.is_active(handle));
        assert!(client.tags().has(GameplayTag::StateImmuneToDamage));
        assert!(!client.drain_messages().iter().any(|m| matches!(
            m.kind,
            MessageKind::MontageStopped { .. } | MessageKind::AbilityEnded { cancelled: true, .. }
        )));
    }

    #[test]
    fn client_follows_server_death_and_ignores_stale_lives() {
        let world = World::new();
        let env = world.env();
        let mut server = server(&world);
        let mut client = client(&world);

        server.set_attribute_base(Attribute::Health, 0.0, &env);
        let mut dead = server.replicated_state();
        dead.death.state = DeathState::DeathFinished;
        client.apply_replicated_state(&dead, &env);
        assert_eq!(client.death_state(), DeathState::DeathFinished);
        assert!(client.tags().has(GameplayTag::StateDead));
        let started = client
            .drain_messages()
            .iter()
            .filter(|m| matches!(m.kind, MessageKind::DeathStarted { .. }))
            .count();
        assert_eq!(started, 1);

        client.receive(NetRequest::ClientResetAvatar { generation: 1 }, &env);
        assert_eq!(client.death_state(), DeathState::NotDead);
        assert_eq!(client.health().generation(), 1);

        // A snapshot from the previous life arrives late.
        client.apply_replicated_state(&dead, &env);
        assert_eq!(client.death_state(), DeathState::NotDead);
    }

    #[test]
    fn requests_from_the_wrong_side_are_ignored() {
        let world = world();
        let env = world.env();
        let mut server = server(&world);
        server.receive(NetRequest::ClientResetAvatar { generation: 5 }, &env);
        assert_eq!(server.health().generation(), 0);
    }
}
