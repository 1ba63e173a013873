//! Applying, ticking and removing effects on this owner.

use crate::ability::{AbilityDef, AbilitySpecHandle};
use crate::attribute::{
    Attribute, AttributeModifier, AttributeSetKind, ChangeCause, ModOp,
};
use crate::effect::{
    ActiveEffectHandle, EffectApplication, EffectContext, EffectError, EffectId, EffectSpec,
    ExecutionDef, ExecutionOutput, ExecutionParams, RemovalListener, ResolvedDuration,
    execution::execution_for,
};
use crate::env::{GameModeProperty, GameplayEnv, OracleError};
use crate::error::GameplayError;
use crate::message::MessageKind;
use crate::ids::ActorId;
use crate::prediction::{KeyStatus, PredictionKey};
use crate::tags::GameplayTag;

use super::{AbilitySystem, ConfigError};

impl AbilitySystem {
    // ========================================================================
    // Building specs
    // ========================================================================

    /// Builds a spec for an effect this owner applies.
    ///
    /// The owner is the instigator, the avatar the causer, and the owner's
    /// current DamageBoost is captured.
    pub fn make_outgoing_spec(
        &self,
        effect: &EffectId,
        level: f32,
        env: &GameplayEnv<'_>,
    ) -> Result<EffectSpec, EffectError> {
        let def = env
            .definitions()?
            .effect(effect)
            .ok_or_else(|| OracleError::EffectNotFound(effect.clone()))?;
        let mut context = EffectContext::new(self.owner);
        if let Some(avatar) = self.avatar {
            context = context.with_causer(avatar);
        }
        let mut spec = EffectSpec::new(def, level, context);
        spec.captured_damage_boost = self.attributes.get(Attribute::DamageBoost);
        Ok(spec)
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Applies `spec` to this owner.
    ///
    /// Without authority only duration effects under a valid prediction key
    /// are applied (as predicted effects); everything else is `Rejected`.
    pub fn apply_effect_spec(
        &mut self,
        spec: EffectSpec,
        env: &GameplayEnv<'_>,
    ) -> Result<EffectApplication, EffectError> {
        let result = self.apply_effect_internal(spec, env);
        self.flush(env);
        result
    }

    pub(crate) fn apply_effect_internal(
        &mut self,
        mut spec: EffectSpec,
        env: &GameplayEnv<'_>,
    ) -> Result<EffectApplication, EffectError> {
        let authority = self.role.is_authority();
        let predicted_key = match (authority, self.prediction.is_valid_for_more_prediction()) {
            (true, _) => None,
            (false, true) => self.prediction.current(),
            (false, false) => {
                tracing::trace!(owner = %self.owner, effect = %spec.def.id, "no prediction key; effect not applied");
                return Ok(EffectApplication::Rejected);
            }
        };
        if spec.context.prediction_key.is_none() {
            spec.context.prediction_key = self.prediction.current();
        }

        match spec.duration()? {
            ResolvedDuration::Instant if authority => self.execute_instant(&spec, env),
            ResolvedDuration::Instant => Ok(EffectApplication::Rejected),
            ResolvedDuration::Timed(seconds) => {
                self.add_active(spec, Some(seconds.max(0.0)), predicted_key)
            }
            ResolvedDuration::Infinite => self.add_active(spec, None, predicted_key),
        }
    }

    fn add_active(
        &mut self,
        spec: EffectSpec,
        duration: Option<f32>,
        predicted_key: Option<PredictionKey>,
    ) -> Result<EffectApplication, EffectError> {
        // Periodic effects do their work as instant applications when they fire.
        let modifiers = if spec.def.period.is_some_and(|p| p > 0.0) {
            Vec::new()
        } else {
            self.resolve_modifiers(&spec)?
        };
        let effect = spec.def.id.clone();
        let granted = spec.def.granted_tags;
        let cause = spec.context.cause(&effect);

        let handle = self.effects.insert(spec, duration, predicted_key);
        for (attribute, op, magnitude) in modifiers {
            self.attributes.add_modifier(
                attribute,
                AttributeModifier {
                    source: handle,
                    op,
                    magnitude,
                },
                &cause,
            );
        }
        self.tags.add_set(granted);
        tracing::debug!(owner = %self.owner, %effect, ?handle, ?duration, ?predicted_key, "effect applied");
        Ok(EffectApplication::Applied(handle))
    }

    fn execute_instant(
        &mut self,
        spec: &EffectSpec,
        env: &GameplayEnv<'_>,
    ) -> Result<EffectApplication, EffectError> {
        let modifiers = self.resolve_modifiers(spec)?;
        let output = match &spec.def.execution {
            Some(execution) => self.run_execution(spec, execution, env)?,
            None => None,
        };

        let cause = spec.context.cause(&spec.def.id);
        for (attribute, op, magnitude) in modifiers {
            self.attributes.apply_instant(attribute, op, magnitude, &cause);
        }
        let magnitude = match output {
            Some(output) if output.attribute.is_meta() => {
                self.attributes
                    .execute_meta(output.attribute, output.magnitude, &cause)
            }
            Some(output) => {
                self.attributes
                    .apply_instant(output.attribute, output.op, output.magnitude, &cause);
                output.magnitude
            }
            None => 0.0,
        };
        tracing::debug!(owner = %self.owner, effect = %spec.def.id, magnitude, "instant effect executed");
        Ok(EffectApplication::Executed { magnitude })
    }

    fn run_execution(
        &self,
        spec: &EffectSpec,
        execution: &ExecutionDef,
        env: &GameplayEnv<'_>,
    ) -> Result<Option<ExecutionOutput>, EffectError> {
        if !self.attributes.has_set(AttributeSetKind::Health) {
            return Err(EffectError::MissingAttributeSet {
                effect: spec.def.id.clone(),
                set: AttributeSetKind::Health,
            });
        }
        let params = ExecutionParams {
            spec,
            base_magnitude: spec.magnitude(&execution.magnitude)?,
            target: self.owner,
            target_tags: self.tags.present(),
            target_damage_resistance: self.attributes.get(Attribute::DamageResistance),
            teams: env.teams().ok(),
        };
        execution_for(execution.kind).execute(&params)
    }

    /// Resolves every modifier magnitude, failing before anything is written.
    fn resolve_modifiers(&self, spec: &EffectSpec) -> Result<Vec<(Attribute, ModOp, f32)>, EffectError> {
        spec.def
            .modifiers
            .iter()
            .map(|modifier| {
                if !self.attributes.has_attribute(modifier.attribute) {
                    return Err(EffectError::MissingAttributeSet {
                        effect: spec.def.id.clone(),
                        set: modifier.attribute.set(),
                    });
                }
                Ok((
                    modifier.attribute,
                    modifier.op,
                    spec.magnitude(&modifier.magnitude)?,
                ))
            })
            .collect()
    }

    // ========================================================================
    // Removal and ticking
    // ========================================================================

    /// Removes an active effect, undoing its modifiers and granted tags.
    pub fn remove_effect(&mut self, handle: ActiveEffectHandle, env: &GameplayEnv<'_>) -> bool {
        let removed = self.remove_effect_internal(handle);
        self.flush(env);
        removed
    }

    pub(crate) fn remove_effect_internal(&mut self, handle: ActiveEffectHandle) -> bool {
        let Some((effect, listeners)) = self.effects.remove(handle) else {
            return false;
        };
        let cause = effect.spec.context.cause(&effect.spec.def.id);
        self.attributes.remove_modifiers(handle, &cause);
        self.tags.remove_set(effect.spec.def.granted_tags);
        tracing::debug!(owner = %self.owner, effect = %effect.spec.def.id, ?handle, "effect removed");

        for listener in listeners {
            match listener {
                RemovalListener::CooldownEnded { ability } => {
                    if !self.role.is_authority() {
                        continue;
                    }
                    if let Some(spec) = self.spec(ability) {
                        let ability_id = spec.def.id.clone();
                        self.push_message(MessageKind::CooldownEnded {
                            handle: ability,
                            ability: ability_id,
                        });
                    }
                }
            }
        }
        true
    }

    /// Expires timed effects and fires periodic ones.
    pub(crate) fn advance_effects(&mut self, dt: f32, env: &GameplayEnv<'_>) {
        if self.effects.is_empty() {
            return;
        }
        let outcome = self.effects.advance(dt);
        if self.role.is_authority() {
            for handle in outcome.periodic {
                let Some(spec) = self.effects.get(handle).map(|effect| effect.spec.clone()) else {
                    continue;
                };
                if let Err(err) = self.execute_instant(&spec, env) {
                    tracing::warn!(
                        owner = %self.owner,
                        effect = %spec.def.id,
                        code = err.error_code(),
                        "periodic effect failed: {err}"
                    );
                }
            }
        }
        for handle in outcome.expired {
            self.remove_effect_internal(handle);
        }
    }

    /// Drops predicted effects whose key the server rejected.
    pub(crate) fn drop_rejected_effects(&mut self) {
        let rejected: Vec<_> = self
            .effects
            .iter()
            .filter(|effect| {
                effect
                    .predicted_key
                    .is_some_and(|key| self.prediction.status(key) == Some(KeyStatus::Rejected))
            })
            .map(|effect| effect.handle)
            .collect();
        for handle in rejected {
            self.remove_effect_internal(handle);
        }
    }

    // ========================================================================
    // Ability-owned effects
    // ========================================================================

    /// Applies the ability's ongoing effects on activation.
    ///
    /// Effects listed as removed-on-end are retained by the instance.
    pub(crate) fn apply_ongoing_effects(
        &mut self,
        handle: AbilitySpecHandle,
        def: &AbilityDef,
        env: &GameplayEnv<'_>,
    ) {
        for effect in &def.ongoing_effects {
            if let Err(err) = self.apply_ability_effect(handle, effect, env) {
                tracing::warn!(owner = %self.owner, %handle, %effect, code = err.error_code(), "ongoing effect failed: {err}");
            }
        }
        if def.ongoing_effects_removed_on_end.is_empty() {
            return;
        }
        if !def.is_instanced() {
            let err = ConfigError::RetainedEffectsOnNonInstanced {
                ability: def.id.clone(),
                context: self.error_context(handle),
            };
            tracing::error!(owner = %self.owner, %handle, code = err.error_code(), "{err}");
            return;
        }

        for effect in &def.ongoing_effects_removed_on_end {
            let applied = match self.apply_ability_effect(handle, effect, env) {
                Ok(applied) => applied,
                Err(err) => {
                    tracing::warn!(owner = %self.owner, %handle, %effect, code = err.error_code(), "ongoing effect failed: {err}");
                    continue;
                }
            };
            let Some(active) = applied.handle() else {
                continue;
            };
            let retained = self
                .spec_mut(handle)
                .is_some_and(|spec| spec.instance.retained_effects.try_push(active).is_ok());
            if !retained {
                let err = ConfigError::RetainedEffectCapacity {
                    ability: def.id.clone(),
                    context: self.error_context(handle),
                };
                tracing::error!(owner = %self.owner, %handle, code = err.error_code(), "{err}");
                self.remove_effect_internal(active);
            }
        }
    }

    fn apply_ability_effect(
        &mut self,
        handle: AbilitySpecHandle,
        effect: &EffectId,
        env: &GameplayEnv<'_>,
    ) -> Result<EffectApplication, EffectError> {
        let level = self.spec(handle).map_or(1, |spec| spec.level) as f32;
        let mut spec = self.make_outgoing_spec(effect, level, env)?;
        spec.context = spec.context.with_source_ability(handle);
        self.apply_effect_internal(spec, env)
    }

    // ========================================================================
    // Ultimate charge
    // ========================================================================

    /// Queues ultimate charge for whoever damaged or healed this owner.
    pub(crate) fn queue_ultimate_charge(
        &mut self,
        instigator: Option<ActorId>,
        amount: f32,
        source: GameplayTag,
    ) {
        let Some(to) = instigator else {
            return;
        };
        if !self.role.is_authority() || to == self.owner || amount <= 0.0 {
            return;
        }
        self.outbound.push(super::Outbound::GrantUltimateCharge {
            to,
            target: self.owner,
            amount,
            source,
        });
    }

    /// Grants ultimate charge earned by damaging or healing `target` (authority only).
    ///
    /// Charge is not earned while the ultimate is active, for the owner
    /// itself, or against targets the team rules do not allow.
    pub fn grant_ultimate_charge(
        &mut self,
        target: ActorId,
        amount: f32,
        source: GameplayTag,
        env: &GameplayEnv<'_>,
    ) -> bool {
        if !self.role.is_authority()
            || !self.attributes.has_set(AttributeSetKind::Ultimate)
            || target == self.owner
            || self.is_ultimate_active()
        {
            return false;
        }
        let allowed = match env.teams() {
            Ok(teams) if source == GameplayTag::UltimateChargeFromHealing => {
                teams.can_cause_healing(self.owner, target)
            }
            Ok(teams) => teams.can_cause_damage(self.owner, target),
            Err(err) => {
                tracing::error!(owner = %self.owner, %target, %err, "granting ultimate charge without a team check");
                true
            }
        };
        if !allowed {
            return false;
        }
        let rate = env
            .game_mode_property(GameModeProperty::UltimateChargeRate)
            .unwrap_or(self.config.default_ultimate_charge_rate);
        let delta = amount * rate;
        if delta <= 0.0 {
            return false;
        }
        self.attributes.apply_instant(
            Attribute::UltimateCharge,
            ModOp::Add,
            delta,
            &ChangeCause::none(),
        );
        self.flush(env);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ability::AbilityDef;
    use crate::effect::{EffectDef, Magnitude, SetByCallerKey};
    use crate::system::Outbound;
    use crate::system::test_support::{ENEMY, OWNER, World, server};
    use crate::tags::TagSet;

    fn incoming_damage(world: &World, amount: f32) -> EffectSpec {
        use crate::env::DefinitionOracle;
        let def = world.definitions.effect(&EffectId::new("ge.damage")).unwrap();
        EffectSpec::new(def, 1.0, EffectContext::new(ENEMY))
            .with_set_by_caller(SetByCallerKey::Damage, amount)
    }

    #[test]
    fn instant_damage_folds_into_health_and_queues_charge() {
        let world = World::new();
        let env = world.env();
        let mut system = server(&world);

        let applied = system
            .apply_effect_spec(incoming_damage(&world, 30.0), &env)
            .unwrap();
        assert_eq!(applied, EffectApplication::Executed { magnitude: 30.0 });
        assert_eq!(system.attribute(Attribute::Health), 70.0);
        assert_eq!(
            system.drain_outbound(),
            vec![Outbound::GrantUltimateCharge {
                to: ENEMY,
                target: OWNER,
                amount: 30.0,
                source: GameplayTag::UltimateChargeFromDamage,
            }]
        );
    }

    #[test]
    fn timed_modifier_is_removed_on_expiry() {
        let mut world = World::new();
        world.definitions.insert_effect(
            EffectDef::timed("ge.fortify", Magnitude::flat(1.0))
                .with_modifier(Attribute::MaxHealth, ModOp::Add, Magnitude::flat(50.0))
                .with_granted_tags(TagSet::IMMUNE_TO_DAMAGE),
        );
        let env = world.env();
        let mut system = server(&world);
        let spec = system
            .make_outgoing_spec(&EffectId::new("ge.fortify"), 1.0, &env)
            .unwrap();
        let handle = system.apply_effect_spec(spec, &env).unwrap().handle().unwrap();
        assert_eq!(system.attribute(Attribute::MaxHealth), 150.0);
        assert!(system.tags().has(GameplayTag::StateImmuneToDamage));

        system.tick(1.5, &env);
        assert!(!system.effects().contains(handle));
        assert_eq!(system.attribute(Attribute::MaxHealth), 100.0);
        assert!(!system.tags().has(GameplayTag::StateImmuneToDamage));
    }

    #[test]
    fn modifier_on_missing_set_is_rejected_without_side_effects() {
        let mut world = World::new();
        world.definitions.insert_effect(
            EffectDef::infinite("ge.haste")
                .with_modifier(Attribute::MaxWalkSpeed, ModOp::Multiply, Magnitude::flat(1.5)),
        );
        let env = world.env();
        let mut system = server(&world);
        let spec = system
            .make_outgoing_spec(&EffectId::new("ge.haste"), 1.0, &env)
            .unwrap();
        assert!(matches!(
            system.apply_effect_spec(spec, &env),
            Err(EffectError::MissingAttributeSet {
                set: AttributeSetKind::Movement,
                ..
            })
        ));
        assert!(system.effects().is_empty());
    }

    #[test]
    fn retained_effects_leave_with_the_ability() {
        let mut world = World::new();
        world
            .definitions
            .insert_effect(EffectDef::infinite("ge.guard").with_granted_tags(TagSet::IMMUNE_TO_DAMAGE));
        let env = world.env();
        let mut system = server(&world);
        let handle = system
            .give_ability(
                Arc::new(AbilityDef::new("ga.guard").with_effect_removed_on_end("ge.guard")),
                1,
                None,
                &env,
            )
            .unwrap();
        system.try_activate(handle, &env).unwrap();
        assert_eq!(system.effects().len(), 1);
        system.end_ability(handle, &env);
        assert!(system.effects().is_empty());
        assert!(!system.tags().has(GameplayTag::StateImmuneToDamage));
    }

    #[test]
    fn ultimate_charge_respects_team_rules_and_rate() {
        let mut world = World::new();
        world.mode.set(GameModeProperty::UltimateChargeRate, 0.5);
        let env = world.env();
        let mut system = server(&world);
        system.add_attribute_set(AttributeSetKind::Ultimate);
        system.give_ability(
            Arc::new(AbilityDef::new("ga.ult").with_cost(Attribute::UltimateCharge, 100.0)),
            1,
            None,
            &env,
        );

        assert!(system.grant_ultimate_charge(ENEMY, 40.0, GameplayTag::UltimateChargeFromDamage, &env));
        assert_eq!(system.attribute(Attribute::UltimateCharge), 20.0);
        // Healing an enemy earns nothing; neither does hitting yourself.
        assert!(!system.grant_ultimate_charge(ENEMY, 40.0, GameplayTag::UltimateChargeFromHealing, &env));
        assert!(!system.grant_ultimate_charge(OWNER, 40.0, GameplayTag::UltimateChargeFromDamage, &env));
    }
}
