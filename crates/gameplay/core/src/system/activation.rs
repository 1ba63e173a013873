//! The activation state machine: `Inactive -> Activating -> Active -> Ending -> Inactive`.

use std::sync::Arc;

use crate::ability::{
    AbilityDef, AbilitySpecHandle, AbilityState, ActivationFailure, GameplayEventData,
};
use crate::env::GameplayEnv;
use crate::error::GameplayError;
use crate::message::MessageKind;
use crate::net::{NetExecutionPolicy, NetRequest, NetRole};
use crate::prediction::{PredictionHost, PredictionKey, RollbackAction, ScopedPredictionWindow};

use super::AbilitySystem;

/// How one activation was started.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Activation {
    pub key: Option<PredictionKey>,
    pub payload: Option<GameplayEventData>,
    /// Pay cost and start the cooldown. False when mirroring a server activation.
    pub commit: bool,
}

impl AbilitySystem {
    /// Checks every activation precondition without changing state.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub fn can_activate(&self, handle: AbilitySpecHandle) -> Result<(), ActivationFailure> {
        let spec = self
            .spec(handle)
            .ok_or(ActivationFailure::UnknownAbility(handle))?;
        let def = &spec.def;

        if self.avatar.is_none() {
            return Err(ActivationFailure::InvalidAvatar);
        }
        let policy = def.net_execution;
        let runs_here = match self.role {
            NetRole::Authority => policy.runs_on_server(),
            NetRole::AutonomousProxy => policy.runs_locally_first(),
            NetRole::SimulatedProxy => false,
        };
        if !runs_here {
            return Err(ActivationFailure::Networking);
        }
        if spec.is_disabled() {
            return Err(ActivationFailure::Disabled);
        }
        if spec.is_active() {
            return Err(ActivationFailure::AlreadyActive);
        }
        // Only an inactive ability can be blocked by its own group.
        if self.arbiter.is_blocked(def.activation_group) {
            return Err(ActivationFailure::ActivationGroupBlocked);
        }

        let owned = self.tags.present();
        let blocked = owned & def.activation_blocked_tags;
        if !blocked.is_empty() {
            return Err(ActivationFailure::TagsBlocked(blocked));
        }
        let missing = def.activation_required_tags.difference(owned);
        if !missing.is_empty() {
            return Err(ActivationFailure::TagsMissing(missing));
        }

        if let Some(remaining) = self.cooldown_remaining(handle) {
            return Err(ActivationFailure::OnCooldown { remaining });
        }
        if let Some(cost) = def.cost
            && (!self.attributes.has_attribute(cost.attribute)
                || self.attributes.get(cost.attribute) < cost.amount)
        {
            return Err(ActivationFailure::CostNotMet);
        }
        Ok(())
    }

    /// Tries to activate an ability the way input would.
    ///
    /// On the owning client, predicted abilities run immediately under a new
    /// prediction key and the server is asked to confirm; server-started
    /// abilities are only requested.
    pub fn try_activate(
        &mut self,
        handle: AbilitySpecHandle,
        env: &GameplayEnv<'_>,
    ) -> Result<(), ActivationFailure> {
        self.try_activate_with_payload(handle, None, env)
    }

    pub fn try_activate_with_payload(
        &mut self,
        handle: AbilitySpecHandle,
        payload: Option<GameplayEventData>,
        env: &GameplayEnv<'_>,
    ) -> Result<(), ActivationFailure> {
        let result = self.try_activate_internal(handle, payload, env);
        self.flush(env);
        result
    }

    pub(crate) fn try_activate_internal(
        &mut self,
        handle: AbilitySpecHandle,
        payload: Option<GameplayEventData>,
        env: &GameplayEnv<'_>,
    ) -> Result<(), ActivationFailure> {
        let policy = self
            .spec(handle)
            .ok_or(ActivationFailure::UnknownAbility(handle))?
            .def
            .net_execution;

        if self.role == NetRole::AutonomousProxy && !policy.runs_locally_first() {
            self.send(NetRequest::ServerTryActivate {
                handle,
                key: None,
                payload,
            });
            return Ok(());
        }

        if let Err(failure) = self.can_activate(handle) {
            self.report_failure(handle, &failure);
            return Err(failure);
        }

        match (self.role, policy) {
            (NetRole::Authority, _) => {
                let mut window = ScopedPredictionWindow::new(self, true);
                let key = window.key();
                // The client must hear about the activation before anything that ends it.
                if policy.runs_on_client() {
                    window.send(NetRequest::ClientActivateAbility {
                        handle,
                        key,
                        payload,
                    });
                }
                window.activate(
                    handle,
                    Activation {
                        key: Some(key),
                        payload,
                        commit: true,
                    },
                    env,
                );
            }
            (NetRole::AutonomousProxy, NetExecutionPolicy::LocalPredicted) => {
                let mut window = ScopedPredictionWindow::new(self, false);
                let key = window.key();
                window.send(NetRequest::ServerTryActivate {
                    handle,
                    key: Some(key),
                    payload,
                });
                if let Err(err) = window
                    .prediction_ledger()
                    .bind_rejection_rollback(
                        key,
                        RollbackAction::EndAbility {
                            ability: handle,
                            activation: key,
                        },
                    )
                {
                    tracing::error!(%handle, %key, %err, "cannot bind activation rollback");
                }
                window.activate(
                    handle,
                    Activation {
                        key: Some(key),
                        payload,
                        commit: true,
                    },
                    env,
                );
            }
            _ => self.activate(
                handle,
                Activation {
                    key: None,
                    payload,
                    commit: true,
                },
                env,
            ),
        }
        Ok(())
    }

    /// Runs an activation whose preconditions already passed.
    pub(crate) fn activate(
        &mut self,
        handle: AbilitySpecHandle,
        activation: Activation,
        env: &GameplayEnv<'_>,
    ) {
        let Some(spec) = self.spec_mut(handle) else {
            return;
        };
        let def = Arc::clone(&spec.def);
        let instance = &mut spec.instance;
        instance.state = AbilityState::Activating;
        instance.group = def.activation_group;
        instance.activation_key = activation.key;
        instance.payload = activation.payload;
        instance.can_be_cancelled = def.can_be_cancelled;
        instance.should_finish_reset = false;
        instance.retained_effects.clear();
        instance.clear_continuation();

        tracing::debug!(
            owner = %self.owner,
            %handle,
            ability = %def.id,
            key = ?activation.key,
            "ability activating"
        );
        self.tags.add_set(def.activation_owned_tags);
        self.push_message(MessageKind::AbilityActivated {
            handle,
            ability: def.id.clone(),
        });

        let local_only = !self.role.is_authority()
            && def.net_execution == NetExecutionPolicy::LocalOnly
            && !self.prediction.is_valid_for_more_prediction();
        if !local_only {
            self.commit_and_apply(handle, &def, activation.commit, env);
        } else {
            // No server rules on local-only work: run it under a fresh key and
            // settle that key here.
            let mut window = ScopedPredictionWindow::new(self, true);
            let key = window.key();
            window.commit_and_apply(handle, &def, activation.commit, env);
            drop(window);
            if self.prediction.confirm(key) {
                self.effects.confirm_prediction(key);
            }
        }

        match self.arbiter.on_ability_activated(handle, def.activation_group) {
            Ok(Some(replaced)) => {
                tracing::debug!(owner = %self.owner, %handle, %replaced, "replacing exclusive ability");
                self.cancel_internal(replaced, true, env);
            }
            Ok(None) => {}
            Err(err) => tracing::error!(
                owner = %self.owner,
                %handle,
                code = err.error_code(),
                "{err}"
            ),
        }

        let Some(spec) = self.spec_mut(handle) else {
            return;
        };
        if spec.instance.state != AbilityState::Activating {
            return;
        }
        spec.instance.state = AbilityState::Active;
        self.behavior_on_activate(handle, &def, env);
    }

    /// Cost, cooldown and ongoing effects of a fresh activation.
    fn commit_and_apply(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        commit: bool,
        env: &GameplayEnv<'_>,
    ) {
        if commit {
            self.commit_ability(handle, def, env);
        }
        self.apply_ongoing_effects(handle, def, env);
    }

    /// Ends an active ability normally.
    pub fn end_ability(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) -> bool {
        let ended = self.end_internal(handle, true, false, env);
        self.flush(env);
        ended
    }

    /// Tears down an activation.
    ///
    /// Retained effects are removed before the arbiter is told; with
    /// `replicate` the other machine is asked to end its copy as well.
    pub(crate) fn end_internal(
        &mut self,
        handle: AbilitySpecHandle,
        replicate: bool,
        cancelled: bool,
        env: &GameplayEnv<'_>,
    ) -> bool {
        let Some(spec) = self.spec_mut(handle) else {
            return false;
        };
        if !matches!(
            spec.instance.state,
            AbilityState::Activating | AbilityState::Active
        ) {
            return false;
        }
        spec.instance.state = AbilityState::Ending;
        let def = Arc::clone(&spec.def);

        self.behavior_on_end(handle, &def, cancelled, env);

        let retained = self
            .spec_mut(handle)
            .map(|spec| std::mem::take(&mut spec.instance.retained_effects))
            .unwrap_or_default();
        for effect in retained {
            self.remove_effect_internal(effect);
        }
        self.arbiter.on_ability_ended(handle);
        self.tags.remove_set(def.activation_owned_tags);

        let montage = match self.spec_mut(handle) {
            Some(spec) => {
                let instance = &mut spec.instance;
                instance.clear_continuation();
                instance.state = AbilityState::Inactive;
                instance.group = def.activation_group;
                instance.activation_key = None;
                instance.payload = None;
                instance.montage.take()
            }
            None => None,
        };
        if let Some(montage) = montage {
            self.push_message(MessageKind::MontageStopped { handle, montage });
        }

        tracing::debug!(owner = %self.owner, %handle, ability = %def.id, cancelled, "ability ended");
        self.push_message(MessageKind::AbilityEnded {
            handle,
            ability: def.id.clone(),
            cancelled,
        });

        if replicate {
            self.replicate_end(handle, &def, cancelled);
        }
        true
    }

    fn replicate_end(&mut self, handle: AbilitySpecHandle, def: &AbilityDef, cancelled: bool) {
        let policy = def.net_execution;
        match self.role {
            NetRole::AutonomousProxy if policy == NetExecutionPolicy::LocalPredicted => {
                self.send(NetRequest::ServerEndAbility { handle, cancelled });
            }
            NetRole::Authority if policy.runs_on_client() && policy != NetExecutionPolicy::LocalOnly => {
                self.send(NetRequest::ClientEndAbility { handle, cancelled });
            }
            _ => {}
        }
    }

    fn report_failure(&mut self, handle: AbilitySpecHandle, failure: &ActivationFailure) {
        tracing::trace!(owner = %self.owner, %handle, %failure, "activation refused");
        if let Some(reason) = failure.failure_tag() {
            self.push_message(MessageKind::ActivationFailed { handle, reason });
        }
    }
}
