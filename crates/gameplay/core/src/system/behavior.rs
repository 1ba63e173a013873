//! What each ability behavior does while active.
//!
//! Behaviors never block: anything that waits (an animation event, a timer,
//! target data from the client) parks a continuation on the instance and is
//! resumed from `tick`, `handle_gameplay_event` or `receive`.

use crate::ability::{
    AbilityBehavior, AbilityDef, AbilitySpecHandle, ActivationGroup, Continuation,
    GameplayEventData, MeleeAttackDef, TimerPurpose,
};
use crate::attribute::{Attribute, AttributeSetKind};
use crate::effect::SetByCallerKey;
use crate::env::{GameModeProperty, GameplayEnv};
use crate::error::GameplayError;
use crate::ids::{ActorId, MontageId};
use crate::message::MessageKind;
use crate::net::NetRequest;
use crate::prediction::RollbackAction;
use crate::tags::GameplayTag;

use super::{AbilitySystem, CancelFilter, Outbound};

impl AbilitySystem {
    pub(crate) fn behavior_on_activate(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        env: &GameplayEnv<'_>,
    ) {
        match &def.behavior {
            AbilityBehavior::Generic { duration, montage } => {
                if let Some(montage) = *montage {
                    self.play_montage(handle, montage);
                }
                if let Some(remaining) = *duration {
                    self.park(
                        handle,
                        Continuation::WaitingForTimer {
                            remaining,
                            purpose: TimerPurpose::EndAbility,
                        },
                    );
                }
            }
            AbilityBehavior::Death => self.begin_death(handle, env),
            AbilityBehavior::Reset => self.perform_reset(handle, env),
            AbilityBehavior::AutoRespawn => {
                // Activated while already dead: do not wait for the next death.
                if self.health.is_dead_or_dying() {
                    self.park_respawn_check(handle);
                }
            }
            AbilityBehavior::MeleeAttack(melee) => self.begin_melee(handle, melee),
        }
    }

    pub(crate) fn behavior_on_end(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        _cancelled: bool,
        env: &GameplayEnv<'_>,
    ) {
        match def.behavior {
            // Death always finishes, even when the ability is cut short.
            AbilityBehavior::Death => {
                if let Some(transition) = self.health.finish_death(&mut self.tags) {
                    self.on_death_transition(transition, env);
                }
            }
            AbilityBehavior::AutoRespawn => {
                if let Some(spec) = self.spec_mut(handle) {
                    spec.instance.should_finish_reset = false;
                }
            }
            _ => {}
        }
    }

    fn park(&mut self, handle: AbilitySpecHandle, continuation: Continuation) {
        if let Some(spec) = self.spec_mut(handle) {
            spec.instance.park(continuation);
        }
    }

    fn play_montage(&mut self, handle: AbilitySpecHandle, montage: MontageId) {
        let Some(spec) = self.spec_mut(handle) else {
            return;
        };
        spec.instance.montage = Some(montage);
        self.push_message(MessageKind::MontagePlayed { handle, montage });

        if self.role.is_authority() || !self.prediction.is_valid_for_more_prediction() {
            return;
        }
        let Some(key) = self.prediction.current() else {
            return;
        };
        let activation = self
            .spec(handle)
            .and_then(|spec| spec.instance.activation_key)
            .unwrap_or(key);
        let rollback = RollbackAction::StopMontage {
            ability: handle,
            activation,
            montage,
        };
        if let Err(err) = self.prediction.bind_rejection_rollback(key, rollback) {
            tracing::warn!(owner = %self.owner, %handle, %key, code = err.error_code(), "montage plays without rollback: {err}");
        }
    }

    /// Stops the montage `handle` is playing, if any.
    pub(crate) fn stop_montage(&mut self, handle: AbilitySpecHandle) {
        let montage = self
            .spec_mut(handle)
            .and_then(|spec| spec.instance.montage.take());
        if let Some(montage) = montage {
            self.push_message(MessageKind::MontageStopped { handle, montage });
        }
    }

    // ========================================================================
    // Timers and events
    // ========================================================================

    /// Counts down timer continuations and resumes the ones that are due.
    pub(crate) fn advance_continuations(&mut self, dt: f32, env: &GameplayEnv<'_>) {
        let mut due = Vec::new();
        for spec in self.specs.iter_mut() {
            if let Some((token, Continuation::WaitingForTimer { remaining, purpose })) =
                spec.instance.continuation.as_mut()
            {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    due.push((spec.handle, *token, *purpose));
                }
            }
        }

        for (handle, token, purpose) in due {
            // An earlier resumption may have replaced or cleared this continuation.
            let still_parked = self
                .spec(handle)
                .and_then(|spec| spec.instance.continuation)
                .is_some_and(|(current, _)| current == token);
            if !still_parked {
                continue;
            }
            if let Some(spec) = self.spec_mut(handle) {
                spec.instance.clear_continuation();
            }
            match purpose {
                TimerPurpose::EndAbility => {
                    self.end_internal(handle, true, false, env);
                }
                TimerPurpose::RespawnCheck => self.respawn_check(handle, env),
                TimerPurpose::Respawn => self.finish_respawn(handle, env),
            }
        }
    }

    pub(crate) fn resume_on_event(
        &mut self,
        handle: AbilitySpecHandle,
        tag: GameplayTag,
        _payload: GameplayEventData,
        env: &GameplayEnv<'_>,
    ) {
        let Some(spec) = self.spec(handle) else {
            return;
        };
        let def = std::sync::Arc::clone(&spec.def);
        match (&def.behavior, tag) {
            (AbilityBehavior::MeleeAttack(melee), GameplayTag::EventMeleeHit) => {
                self.resolve_melee_hit(handle, melee, env);
            }
            _ => {
                tracing::debug!(owner = %self.owner, %handle, tag = tag.name(), "event has no handler; ending ability");
                self.end_internal(handle, true, false, env);
            }
        }
    }

    // ========================================================================
    // Death
    // ========================================================================

    fn begin_death(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) {
        self.cancel_matching(CancelFilter::not_surviving_death().ignoring(handle), env);

        match self
            .arbiter
            .change_group(handle, ActivationGroup::ExclusiveBlocking)
        {
            Ok(replaced) => {
                if let Some(spec) = self.spec_mut(handle) {
                    spec.instance.group = ActivationGroup::ExclusiveBlocking;
                }
                if let Some(replaced) = replaced {
                    self.cancel_internal(replaced, true, env);
                }
            }
            Err(err) => {
                tracing::error!(owner = %self.owner, %handle, code = err.error_code(), "death cannot claim the activation group: {err}");
            }
        }

        if let Some(transition) = self.health.start_death(&mut self.tags) {
            self.on_death_transition(transition, env);
        }

        let remaining = env
            .game_mode_property(GameModeProperty::DeathDuration)
            .unwrap_or(self.config.default_death_duration);
        self.park(
            handle,
            Continuation::WaitingForTimer {
                remaining,
                purpose: TimerPurpose::EndAbility,
            },
        );
    }

    /// Lets respawn abilities that are listening start their check.
    pub(crate) fn on_death_started(&mut self, _env: &GameplayEnv<'_>) {
        let listeners: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| spec.is_active() && matches!(spec.def.behavior, AbilityBehavior::AutoRespawn))
            .map(|spec| spec.handle)
            .collect();
        for handle in listeners {
            self.park_respawn_check(handle);
        }
    }

    // ========================================================================
    // Reset and respawn
    // ========================================================================

    fn perform_reset(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) {
        if let Some(spec) = self.spec_mut(handle) {
            spec.instance.can_be_cancelled = false;
        }
        self.cancel_matching(CancelFilter::not_surviving_death().ignoring(handle), env);

        // Death is not cancellable; a reset ends it anyway.
        let dying: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| {
                spec.handle != handle
                    && spec.is_active()
                    && matches!(spec.def.behavior, AbilityBehavior::Death)
            })
            .map(|spec| spec.handle)
            .collect();
        for death in dying {
            self.cancel_internal(death, true, env);
        }

        if self.role.is_authority() {
            self.reset_avatar_internal(env);
        }
        self.push_message(MessageKind::PlayerReset);
        self.end_internal(handle, true, false, env);
    }

    /// A new life started: pending respawns are moot.
    pub(crate) fn on_player_reset(&mut self) {
        for spec in self.specs.iter_mut() {
            if matches!(spec.def.behavior, AbilityBehavior::AutoRespawn) && spec.is_active() {
                spec.instance.should_finish_reset = false;
                spec.instance.clear_continuation();
            }
        }
    }

    fn park_respawn_check(&mut self, handle: AbilitySpecHandle) {
        self.park(
            handle,
            Continuation::WaitingForTimer {
                remaining: 0.0,
                purpose: TimerPurpose::RespawnCheck,
            },
        );
    }

    fn can_respawn(&self) -> bool {
        !self.attributes.has_set(AttributeSetKind::Lives) || self.attributes.get(Attribute::Lives) > 0.0
    }

    fn respawn_check(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) {
        if !self.can_respawn() {
            tracing::info!(owner = %self.owner, "out of lives; spectating");
            self.tags.set_count(GameplayTag::StateSpectating, 1);
            self.push_message(MessageKind::RespawnFailed);
            return;
        }
        let duration = env
            .game_mode_property(GameModeProperty::RespawnTime)
            .unwrap_or(self.config.default_respawn_time);
        self.push_message(MessageKind::RespawnStarted { duration });
        if let Some(spec) = self.spec_mut(handle) {
            spec.instance.should_finish_reset = true;
            spec.instance.park(Continuation::WaitingForTimer {
                remaining: duration,
                purpose: TimerPurpose::Respawn,
            });
        }
    }

    fn finish_respawn(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) {
        let Some(spec) = self.spec_mut(handle) else {
            return;
        };
        if !spec.instance.should_finish_reset {
            return;
        }
        spec.instance.should_finish_reset = false;
        tracing::info!(owner = %self.owner, "respawning");
        if self.role.is_authority() {
            self.reset_avatar_internal(env);
        }
        self.push_message(MessageKind::RespawnCompleted);
    }

    // ========================================================================
    // Melee
    // ========================================================================

    fn begin_melee(&mut self, handle: AbilitySpecHandle, melee: &MeleeAttackDef) {
        if let Some(montage) = melee.montage {
            self.play_montage(handle, montage);
        }
        // The server mirrors a client swing: the client resolves the hit and sends targets.
        let remote_swing = self.role.is_authority()
            && self
                .spec(handle)
                .and_then(|spec| spec.instance.activation_key)
                .is_some_and(|key| !key.is_server_generated());
        let continuation = if remote_swing {
            Continuation::WaitingForTargetData
        } else {
            Continuation::WaitingForEvent {
                tag: GameplayTag::EventMeleeHit,
            }
        };
        self.park(handle, continuation);
    }

    fn resolve_melee_hit(
        &mut self,
        handle: AbilitySpecHandle,
        melee: &MeleeAttackDef,
        env: &GameplayEnv<'_>,
    ) {
        let targets = self.melee_targets(melee, env);
        if self.role.is_authority() {
            self.apply_melee_hits(handle, melee, &targets, env);
        } else {
            let key = self.spec(handle).and_then(|spec| spec.instance.activation_key);
            self.send(NetRequest::ServerSetTargetData {
                handle,
                key,
                targets,
            });
        }
        self.end_internal(handle, true, false, env);
    }

    /// Hostile actors inside the swing, excluding this owner.
    fn melee_targets(&self, melee: &MeleeAttackDef, env: &GameplayEnv<'_>) -> Vec<ActorId> {
        let spatial = match env.spatial() {
            Ok(spatial) => spatial,
            Err(err) => {
                tracing::warn!(owner = %self.owner, %err, "melee swing without spatial data");
                return Vec::new();
            }
        };
        let Some(avatar) = self.avatar else {
            return Vec::new();
        };
        let Some(from) = spatial.transform(avatar) else {
            return Vec::new();
        };
        let teams = env.teams().ok();
        spatial
            .actors_within(from.position, melee.targeting.reach())
            .into_iter()
            .filter(|(actor, _)| *actor != avatar && *actor != self.owner)
            .filter(|(_, position)| melee.targeting.contains(&from, *position))
            .filter(|(actor, _)| teams.is_none_or(|teams| teams.can_cause_damage(self.owner, *actor)))
            .map(|(actor, _)| actor)
            .collect()
    }

    /// Server side of a client swing: keep only targets the server agrees with.
    pub(crate) fn receive_target_data(
        &mut self,
        handle: AbilitySpecHandle,
        targets: Vec<ActorId>,
        env: &GameplayEnv<'_>,
    ) {
        let Some(spec) = self.spec(handle) else {
            return;
        };
        let AbilityBehavior::MeleeAttack(melee) = &spec.def.behavior else {
            tracing::warn!(owner = %self.owner, %handle, "target data for an ability that does not take targets");
            return;
        };
        if !spec.instance.awaits_target_data() {
            tracing::debug!(owner = %self.owner, %handle, "unexpected target data");
            return;
        }
        let melee = melee.clone();
        let valid = self.melee_targets(&melee, env);
        let accepted: Vec<_> = targets
            .into_iter()
            .filter(|target| {
                let ok = valid.contains(target);
                if !ok {
                    tracing::debug!(owner = %self.owner, %handle, %target, "dropping target the server cannot confirm");
                }
                ok
            })
            .collect();

        if let Some(spec) = self.spec_mut(handle) {
            spec.instance.clear_continuation();
        }
        self.apply_melee_hits(handle, &melee, &accepted, env);
        self.end_internal(handle, true, false, env);
    }

    fn apply_melee_hits(
        &mut self,
        handle: AbilitySpecHandle,
        melee: &MeleeAttackDef,
        targets: &[ActorId],
        env: &GameplayEnv<'_>,
    ) {
        let level = self.spec(handle).map_or(1, |spec| spec.level) as f32;
        for &target in targets {
            let spec = match self.make_outgoing_spec(&melee.damage_effect, level, env) {
                Ok(spec) => spec,
                Err(err) => {
                    tracing::warn!(owner = %self.owner, %handle, effect = %melee.damage_effect, code = err.error_code(), "melee damage not built: {err}");
                    return;
                }
            };
            let mut spec = spec.with_set_by_caller(SetByCallerKey::Damage, melee.base_damage);
            spec.context = spec.context.with_source_ability(handle);
            tracing::debug!(owner = %self.owner, %handle, %target, "melee hit");
            self.outbound.push(Outbound::ApplyEffect { target, spec });
        }
    }
}
