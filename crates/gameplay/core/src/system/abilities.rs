//! Granting, removing and bulk-cancelling abilities.

use std::sync::Arc;

use crate::ability::{
    AbilityDef, AbilityId, AbilitySpec, AbilitySpecHandle, ActivationMethod,
};
use crate::attribute::Attribute;
use crate::config::GameplayConfig;
use crate::env::GameplayEnv;
use crate::ids::ActorId;
use crate::message::MessageKind;
use crate::net::NetRequest;
use crate::tags::{InputTag, TagSet};

use super::AbilitySystem;

/// Selects the active abilities a bulk cancel applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CancelFilter {
    /// Only abilities carrying all of these tags.
    pub with_tags: TagSet,
    /// Skip abilities carrying any of these tags.
    pub without_tags: TagSet,
    pub ignore: Option<AbilitySpecHandle>,
}

impl CancelFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Abilities that do not survive their owner's death.
    pub fn not_surviving_death() -> Self {
        Self {
            without_tags: TagSet::SURVIVES_DEATH,
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.with_tags = tags;
        self
    }

    pub fn ignoring(mut self, handle: AbilitySpecHandle) -> Self {
        self.ignore = Some(handle);
        self
    }

    pub fn matches(&self, spec: &AbilitySpec) -> bool {
        let tags = spec.tags();
        self.ignore != Some(spec.handle)
            && tags.contains(self.with_tags)
            && !tags.intersects(self.without_tags)
    }
}

impl AbilitySystem {
    // ========================================================================
    // Grants
    // ========================================================================

    /// Grants an ability (authority only).
    ///
    /// Returns `None` on non-authoritative machines or when the owner already
    /// holds the maximum number of abilities.
    pub fn give_ability(
        &mut self,
        def: Arc<AbilityDef>,
        level: u32,
        source: Option<ActorId>,
        env: &GameplayEnv<'_>,
    ) -> Option<AbilitySpecHandle> {
        let input_tag = def.input_tag;
        self.give_ability_with_input(def, level, source, input_tag, env)
    }

    /// Like [`give_ability`](Self::give_ability), binding the grant to `input_tag`
    /// instead of the definition's input.
    pub fn give_ability_with_input(
        &mut self,
        def: Arc<AbilityDef>,
        level: u32,
        source: Option<ActorId>,
        input_tag: Option<InputTag>,
        env: &GameplayEnv<'_>,
    ) -> Option<AbilitySpecHandle> {
        if !self.role.is_authority() {
            return None;
        }
        if self.specs.len() >= GameplayConfig::MAX_ABILITIES {
            tracing::error!(
                owner = %self.owner,
                ability = %def.id,
                "ability limit reached; grant skipped"
            );
            return None;
        }
        self.next_handle = self.next_handle.wrapping_add(1);
        let handle = AbilitySpecHandle(self.next_handle);
        if def.net_execution.runs_on_client() {
            self.send(NetRequest::ClientGiveAbility {
                handle,
                ability: def.id.clone(),
                level,
                input_tag,
            });
        }
        let mut spec = AbilitySpec::new(handle, def, level, source);
        spec.input_tag = input_tag;
        self.insert_spec(spec, env);
        Some(handle)
    }

    /// Mirrors a grant made by the server, keeping the server's handle.
    pub(crate) fn mirror_ability(
        &mut self,
        handle: AbilitySpecHandle,
        ability: &AbilityId,
        level: u32,
        input_tag: Option<InputTag>,
        env: &GameplayEnv<'_>,
    ) {
        if self.spec(handle).is_some() {
            return;
        }
        let def = match env.definitions() {
            Ok(definitions) => definitions.ability(ability),
            Err(err) => {
                tracing::error!(owner = %self.owner, %ability, %err, "cannot mirror granted ability");
                return;
            }
        };
        let Some(def) = def else {
            tracing::error!(owner = %self.owner, %ability, "granted ability has no local definition");
            return;
        };
        let mut spec = AbilitySpec::new(handle, def, level, None);
        spec.input_tag = input_tag;
        self.insert_spec(spec, env);
    }

    fn insert_spec(&mut self, spec: AbilitySpec, env: &GameplayEnv<'_>) {
        let handle = spec.handle;
        let ability = spec.def.id.clone();
        tracing::debug!(owner = %self.owner, %handle, %ability, "ability granted");
        self.specs.push(spec);
        self.refresh_ultimate_cap();
        self.push_message(MessageKind::AbilityGranted { handle, ability });
        self.activate_passives(env);
    }

    /// Removes a granted ability, cancelling it first (authority only).
    pub fn remove_ability(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) -> bool {
        if !self.role.is_authority() || self.spec(handle).is_none() {
            return false;
        }
        self.send(NetRequest::ClientRemoveAbility { handle });
        self.drop_spec(handle, env);
        self.flush(env);
        true
    }

    pub(crate) fn drop_spec(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) {
        if self.is_active(handle) {
            self.end_internal(handle, true, true, env);
        }
        let Some(index) = self.specs.iter().position(|spec| spec.handle == handle) else {
            return;
        };
        let spec = self.specs.remove(index);
        tracing::debug!(owner = %self.owner, %handle, ability = %spec.def.id, "ability removed");
        self.refresh_ultimate_cap();
        self.push_message(MessageKind::AbilityRemoved {
            handle,
            ability: spec.def.id.clone(),
        });
    }

    pub fn find_ability(&self, id: &AbilityId) -> Option<AbilitySpecHandle> {
        self.specs
            .iter()
            .find(|spec| &spec.def.id == id)
            .map(|spec| spec.handle)
    }

    // ========================================================================
    // Enable / disable
    // ========================================================================

    /// Disables every ability carrying any of `tags`, cancelling active ones.
    /// Authority only.
    pub fn disable_abilities_with_tags(&mut self, tags: TagSet, env: &GameplayEnv<'_>) {
        if !self.role.is_authority() {
            return;
        }
        let mut to_cancel = Vec::new();
        for spec in self.specs.iter_mut() {
            if spec.tags().intersects(tags) {
                spec.dynamic_tags |= TagSet::DISABLED;
                if spec.is_active() {
                    to_cancel.push(spec.handle);
                }
            }
        }
        for handle in to_cancel {
            self.cancel_internal(handle, false, env);
        }
        self.flush(env);
    }

    /// Re-enables abilities disabled through [`disable_abilities_with_tags`](Self::disable_abilities_with_tags).
    pub fn enable_abilities_with_tags(&mut self, tags: TagSet, env: &GameplayEnv<'_>) {
        if !self.role.is_authority() {
            return;
        }
        for spec in self.specs.iter_mut() {
            if (spec.def.ability_tags | spec.dynamic_tags.difference(TagSet::DISABLED))
                .intersects(tags)
            {
                spec.dynamic_tags.remove(TagSet::DISABLED);
            }
        }
        self.activate_passives(env);
        self.flush(env);
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels an ability if it is active and cancellable.
    pub fn cancel_ability(&mut self, handle: AbilitySpecHandle, env: &GameplayEnv<'_>) -> bool {
        let cancelled = self.cancel_internal(handle, false, env);
        self.flush(env);
        cancelled
    }

    /// Cancels every active, cancellable ability matching `filter`.
    pub fn cancel_abilities(&mut self, filter: CancelFilter, env: &GameplayEnv<'_>) -> usize {
        let cancelled = self.cancel_matching(filter, env);
        self.flush(env);
        cancelled
    }

    pub(crate) fn cancel_matching(&mut self, filter: CancelFilter, env: &GameplayEnv<'_>) -> usize {
        let handles: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| spec.is_active() && filter.matches(spec))
            .map(|spec| spec.handle)
            .collect();
        handles
            .into_iter()
            .filter(|handle| self.cancel_internal(*handle, false, env))
            .count()
    }

    /// Cancels `handle`. `force` ignores the ability's cancellable flag.
    pub(crate) fn cancel_internal(
        &mut self,
        handle: AbilitySpecHandle,
        force: bool,
        env: &GameplayEnv<'_>,
    ) -> bool {
        let Some(spec) = self.spec(handle) else {
            return false;
        };
        if !spec.is_active() || (!force && !spec.instance.can_be_cancelled) {
            return false;
        }
        self.end_internal(handle, true, true, env)
    }

    // ========================================================================
    // Passives and ultimate
    // ========================================================================

    /// Activates passive abilities that are not running yet.
    ///
    /// Passives wait for an avatar and for game-mode data; on the owning
    /// client only abilities that may start locally are considered.
    pub(crate) fn activate_passives(&mut self, env: &GameplayEnv<'_>) {
        if !self.gameplay_ready || self.avatar.is_none() {
            return;
        }
        let authority = self.role.is_authority();
        let passives: Vec<_> = self
            .specs
            .iter()
            .filter(|spec| {
                let policy = spec.def.net_execution;
                spec.def.activation_method == ActivationMethod::Passive
                    && !spec.is_active()
                    && !spec.is_disabled()
                    && if authority {
                        policy.runs_on_server()
                    } else {
                        policy.runs_locally_first()
                    }
            })
            .map(|spec| spec.handle)
            .collect();
        for handle in passives {
            if let Err(failure) = self.try_activate_internal(handle, None, env) {
                tracing::debug!(owner = %self.owner, %handle, %failure, "passive ability did not activate");
            }
        }
    }

    /// The first ability paying its cost in ultimate charge.
    pub fn ultimate_ability(&self) -> Option<&AbilitySpec> {
        self.specs.iter().find(|spec| {
            spec.def
                .cost
                .is_some_and(|cost| cost.attribute == Attribute::UltimateCharge)
        })
    }

    pub fn is_ultimate_active(&self) -> bool {
        self.ultimate_ability().is_some_and(AbilitySpec::is_active)
    }

    /// Caps ultimate charge at the cost of the ultimate ability.
    pub(crate) fn refresh_ultimate_cap(&mut self) {
        let cap = self
            .ultimate_ability()
            .and_then(|spec| spec.def.cost)
            .map(|cost| cost.amount.abs())
            .unwrap_or(0.0);
        self.attributes.set_ultimate_charge_cap(cap);
    }
}
