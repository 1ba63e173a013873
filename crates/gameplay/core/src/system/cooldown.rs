//! Committing an activation: paying the cost and starting the cooldown.

use crate::ability::{AbilityDef, AbilitySpecHandle};
use crate::attribute::{ChangeCause, ModOp};
use crate::effect::{ActiveEffectHandle, RemovalListener, SetByCallerKey};
use crate::env::GameplayEnv;
use crate::error::GameplayError;
use crate::message::MessageKind;

use super::{AbilitySystem, ConfigError};

impl AbilitySystem {
    /// Seconds until `handle` may activate again, or `None` when it is off cooldown.
    ///
    /// An ability is on cooldown while an effect built from its cooldown
    /// definition is active; an infinite cooldown reports `f32::INFINITY`.
    pub fn cooldown_remaining(&self, handle: AbilitySpecHandle) -> Option<f32> {
        let cooldown = self.spec(handle)?.def.cooldown.as_ref()?;
        let effect = self.effects.find_by_effect(&cooldown.effect)?;
        Some(effect.remaining.unwrap_or(f32::INFINITY))
    }

    pub(crate) fn commit_ability(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        env: &GameplayEnv<'_>,
    ) {
        if self.role.is_authority() {
            self.commit_cost(def);
        }
        if let Err(err) = self.apply_cooldown(handle, def, env) {
            tracing::error!(
                owner = %self.owner,
                %handle,
                ability = %def.id,
                key = ?err.context().and_then(|context| context.prediction_key),
                code = err.error_code(),
                "cooldown skipped: {err}"
            );
        }
    }

    fn commit_cost(&mut self, def: &AbilityDef) {
        let Some(cost) = def.cost else {
            return;
        };
        let cause = ChangeCause::from_instigator(self.owner);
        self.attributes
            .apply_instant(cost.attribute, ModOp::Add, -cost.amount, &cause);
    }

    fn apply_cooldown(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        env: &GameplayEnv<'_>,
    ) -> Result<Option<ActiveEffectHandle>, ConfigError> {
        let Some(cooldown) = &def.cooldown else {
            return Ok(None);
        };
        let level = self.spec(handle).map_or(1, |spec| spec.level) as f32;
        let mut spec = self.make_outgoing_spec(&cooldown.effect, level, env)?;
        spec.context = spec.context.with_source_ability(handle);

        if cooldown.use_set_by_caller_duration {
            if !spec.def.has_set_by_caller_duration() {
                return Err(ConfigError::CooldownDurationMisconfigured {
                    ability: def.id.clone(),
                    effect: cooldown.effect.clone(),
                    context: self.error_context(handle),
                });
            }
            if cooldown.duration <= 0.0 {
                return Err(ConfigError::NonPositiveCooldown {
                    ability: def.id.clone(),
                    duration: cooldown.duration,
                    context: self.error_context(handle),
                });
            }
            spec.set_set_by_caller(SetByCallerKey::Duration, cooldown.duration);
        }

        let Some(effect) = self.apply_effect_internal(spec, env)?.handle() else {
            return Ok(None);
        };
        if self.role.is_authority() {
            let remaining = self.effects.remaining(effect).unwrap_or(f32::INFINITY);
            self.push_message(MessageKind::CooldownStarted {
                handle,
                ability: def.id.clone(),
                remaining,
            });
            self.effects
                .add_removal_listener(effect, RemovalListener::CooldownEnded { ability: handle });
        }
        Ok(Some(effect))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ability::{
        AbilityDef, AbilityId, AbilitySpecHandle, ActivationFailure, CooldownConfig,
    };
    use crate::attribute::{Attribute, AttributeSetKind};
    use crate::error::{ErrorContext, ErrorSeverity, GameplayError};
    use crate::ids::ActorId;
    use crate::message::MessageKind;
    use crate::prediction::ScopedPredictionWindow;
    use crate::system::ConfigError;
    use crate::system::test_support::{World, client, server};

    #[test]
    fn cooldown_blocks_until_the_effect_expires() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        let handle = system
            .give_ability(
                Arc::new(
                    AbilityDef::new("ga.dash")
                        .with_cooldown(CooldownConfig::with_duration("ge.cooldown", 2.0)),
                ),
                1,
                None,
                &env,
            )
            .unwrap();

        system.try_activate(handle, &env).unwrap();
        system.end_ability(handle, &env);
        assert_eq!(system.cooldown_remaining(handle), Some(2.0));
        assert!(matches!(
            system.can_activate(handle),
            Err(ActivationFailure::OnCooldown { .. })
        ));
        assert!(system.drain_messages().iter().any(|m| matches!(
            m.kind,
            MessageKind::CooldownStarted { remaining, .. } if remaining == 2.0
        )));

        system.tick(2.5, &env);
        assert_eq!(system.cooldown_remaining(handle), None);
        assert!(system.can_activate(handle).is_ok());
        assert!(system
            .drain_messages()
            .iter()
            .any(|m| matches!(m.kind, MessageKind::CooldownEnded { .. })));
    }

    #[test]
    fn misconfigured_cooldown_is_skipped() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        // ge.damage is instant and does not read a set-by-caller duration.
        let handle = system
            .give_ability(
                Arc::new(
                    AbilityDef::new("ga.broken")
                        .with_cooldown(CooldownConfig::with_duration("ge.damage", 2.0)),
                ),
                1,
                None,
                &env,
            )
            .unwrap();
        system.try_activate(handle, &env).unwrap();
        system.end_ability(handle, &env);
        assert_eq!(system.cooldown_remaining(handle), None);
    }

    #[test]
    fn cooldown_errors_name_the_predicted_activation() {
        let mut world = World::new();
        let def = world.definitions.insert_ability(
            AbilityDef::new("ga.broken")
                .with_cooldown(CooldownConfig::with_duration("ge.damage", 2.0)),
        );
        let env = world.env();
        let mut system = client(&world);
        let handle = AbilitySpecHandle(9);
        system.mirror_ability(handle, &AbilityId::new("ga.broken"), 1, None, &env);
        let owner = system.owner();

        let mut window = ScopedPredictionWindow::new(&mut system, true);
        let key = window.key();
        let err = window.apply_cooldown(handle, &def, &env).unwrap_err();

        assert!(matches!(err, ConfigError::CooldownDurationMisconfigured { .. }));
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(
            err.context(),
            Some(&ErrorContext::new(owner).with_ability(handle).with_prediction_key(key))
        );
        assert_eq!(err.context().and_then(|context| context.owner), Some(ActorId(1)));
    }

    #[test]
    fn cost_is_paid_on_commit() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);
        system.add_attribute_set(AttributeSetKind::Ultimate);
        let ultimate = system
            .give_ability(
                Arc::new(AbilityDef::new("ga.ult").with_cost(Attribute::UltimateCharge, 100.0)),
                1,
                None,
                &env,
            )
            .unwrap();
        assert_eq!(system.attributes().ultimate_charge_cap(), 100.0);
        assert!(system.set_attribute_base(Attribute::UltimateCharge, 100.0, &env));

        system.try_activate(ultimate, &env).unwrap();
        assert_eq!(system.attribute(Attribute::UltimateCharge), 0.0);
    }
}
