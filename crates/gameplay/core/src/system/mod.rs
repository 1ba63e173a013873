//! The ability system of one ability-owner.
//!
//! [`AbilitySystem`] owns everything the core keeps per owner: attributes,
//! counted tags, active effects, granted abilities, the activation-group
//! arbiter, the prediction ledger and the death lifecycle. It is driven by
//! method calls (input, gameplay events, replicated requests, ticks) and
//! reports through three queues the host drains after every step:
//!
//! - [`GameplayMessage`]s for UI and other gameplay systems,
//! - [`NetRequest`]s for the same owner's copy on the other machine,
//! - [`Outbound`] work addressed to other owners (cross-owner effects,
//!   ultimate charge).
//!
//! All methods run on the single simulation thread; nothing here blocks.

mod abilities;
mod activation;
mod behavior;
mod cooldown;
mod effects;
mod error;
mod events;
mod input;
mod replication;

pub use abilities::CancelFilter;
pub use error::ConfigError;
pub use replication::ReplicatedState;

use std::collections::BTreeSet;

use crate::ability::{AbilitySpec, AbilitySpecHandle, ActivationGroupArbiter};
use crate::attribute::{
    Attribute, AttributeSetKind, AttributeStore, ChangeCause, HealthBaseValues,
};
use crate::config::GameplayConfig;
use crate::effect::{ActiveEffectContainer, EffectSpec};
use crate::env::GameplayEnv;
use crate::error::ErrorContext;
use crate::health::{DeathState, HealthComponent};
use crate::ids::ActorId;
use crate::message::{GameplayMessage, MessageKind};
use crate::net::{NetRequest, NetRole};
use crate::prediction::{PredictionHost, PredictionLedger};
use crate::tags::{GameplayTag, InputTag, TagCountContainer, TagSet};

/// Work this owner produced for another owner.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Apply `spec` to `target` (melee hits).
    ApplyEffect { target: ActorId, spec: EffectSpec },
    /// `to` damaged or healed this owner; it may earn ultimate charge.
    ///
    /// `source` is [`GameplayTag::UltimateChargeFromDamage`] or
    /// [`GameplayTag::UltimateChargeFromHealing`].
    GrantUltimateCharge {
        to: ActorId,
        target: ActorId,
        amount: f32,
        source: GameplayTag,
    },
}

/// Per-owner ability system.
pub struct AbilitySystem {
    owner: ActorId,
    avatar: Option<ActorId>,
    role: NetRole,
    config: GameplayConfig,

    attributes: AttributeStore,
    health_base: HealthBaseValues,
    tags: TagCountContainer,
    effects: ActiveEffectContainer,
    specs: Vec<AbilitySpec>,
    next_handle: u32,
    arbiter: ActivationGroupArbiter,
    prediction: PredictionLedger,
    health: HealthComponent,

    inputs_pressed: Vec<InputTag>,
    inputs_released: Vec<InputTag>,
    inputs_held: BTreeSet<InputTag>,
    gameplay_ready: bool,
    flushing: bool,

    messages: Vec<GameplayMessage>,
    requests: Vec<NetRequest>,
    outbound: Vec<Outbound>,
}

impl AbilitySystem {
    pub fn new(owner: ActorId, role: NetRole, config: GameplayConfig) -> Self {
        Self {
            owner,
            avatar: None,
            role,
            config,
            attributes: AttributeStore::new(),
            health_base: HealthBaseValues::default(),
            tags: TagCountContainer::new(),
            effects: ActiveEffectContainer::new(),
            specs: Vec::new(),
            next_handle: 0,
            arbiter: ActivationGroupArbiter::new(),
            prediction: PredictionLedger::new(role),
            health: HealthComponent::new(),
            inputs_pressed: Vec::new(),
            inputs_released: Vec::new(),
            inputs_held: BTreeSet::new(),
            gameplay_ready: false,
            flushing: false,
            messages: Vec::new(),
            requests: Vec::new(),
            outbound: Vec::new(),
        }
    }

    // ========================================================================
    // Identity
    // ========================================================================

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn avatar(&self) -> Option<ActorId> {
        self.avatar
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    /// Binds (or clears) the avatar the owner acts through.
    ///
    /// A new avatar gives passive abilities another chance to activate.
    pub fn set_avatar(&mut self, avatar: Option<ActorId>, env: &GameplayEnv<'_>) {
        if self.avatar == avatar {
            return;
        }
        tracing::debug!(owner = %self.owner, ?avatar, "avatar changed");
        self.avatar = avatar;
        if avatar.is_none() {
            self.cancel_matching(CancelFilter::all(), env);
            self.clear_ability_input();
        }
        self.activate_passives(env);
        self.flush(env);
    }

    /// Game-mode data is loaded and the owner finished initializing.
    pub fn set_gameplay_ready(&mut self, ready: bool, env: &GameplayEnv<'_>) {
        self.gameplay_ready = ready;
        if ready {
            self.activate_passives(env);
            self.flush(env);
        }
    }

    pub fn is_gameplay_ready(&self) -> bool {
        self.gameplay_ready
    }

    // ========================================================================
    // Attributes and tags
    // ========================================================================

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn attribute(&self, attribute: Attribute) -> f32 {
        self.attributes.get(attribute)
    }

    pub fn add_attribute_set(&mut self, kind: AttributeSetKind) -> bool {
        let added = self.attributes.add_set(kind);
        if added && kind == AttributeSetKind::Ultimate {
            self.refresh_ultimate_cap();
        }
        added
    }

    pub fn remove_attribute_set(&mut self, kind: AttributeSetKind) -> bool {
        let removed = self.attributes.remove_set(kind);
        if removed && kind == AttributeSetKind::Ultimate {
            self.refresh_ultimate_cap();
        }
        removed
    }

    /// Initializes the health set from a base-values asset, registering it if needed.
    pub fn init_health(&mut self, values: HealthBaseValues, env: &GameplayEnv<'_>) {
        self.health_base = values;
        self.attributes.add_set(AttributeSetKind::Health);
        self.write_health_base();
        self.flush(env);
    }

    /// Sets a base value directly (authority only). Used by game modes and tests.
    pub fn set_attribute_base(
        &mut self,
        attribute: Attribute,
        value: f32,
        env: &GameplayEnv<'_>,
    ) -> bool {
        if !self.role.is_authority() {
            return false;
        }
        let changed = self
            .attributes
            .set_base(attribute, value, &ChangeCause::none());
        self.flush(env);
        changed
    }

    pub fn tags(&self) -> &TagCountContainer {
        &self.tags
    }

    pub fn owned_tags(&self) -> TagSet {
        self.tags.present()
    }

    pub fn add_loose_tag(&mut self, tag: GameplayTag) {
        self.tags.add(tag, 1);
    }

    pub fn remove_loose_tag(&mut self, tag: GameplayTag) {
        self.tags.remove(tag, 1);
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn effects(&self) -> &ActiveEffectContainer {
        &self.effects
    }

    pub fn arbiter(&self) -> &ActivationGroupArbiter {
        &self.arbiter
    }

    pub fn prediction(&self) -> &PredictionLedger {
        &self.prediction
    }

    pub fn health(&self) -> &HealthComponent {
        &self.health
    }

    pub fn death_state(&self) -> DeathState {
        self.health.state()
    }

    // ========================================================================
    // Specs
    // ========================================================================

    pub fn spec(&self, handle: AbilitySpecHandle) -> Option<&AbilitySpec> {
        self.specs.iter().find(|spec| spec.handle == handle)
    }

    pub fn specs(&self) -> impl Iterator<Item = &AbilitySpec> {
        self.specs.iter()
    }

    pub(crate) fn spec_mut(&mut self, handle: AbilitySpecHandle) -> Option<&mut AbilitySpec> {
        self.specs.iter_mut().find(|spec| spec.handle == handle)
    }

    pub fn is_active(&self, handle: AbilitySpecHandle) -> bool {
        self.spec(handle).is_some_and(AbilitySpec::is_active)
    }

    // ========================================================================
    // Output queues
    // ========================================================================

    pub fn drain_messages(&mut self) -> Vec<GameplayMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn drain_requests(&mut self) -> Vec<NetRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    pub(crate) fn push_message(&mut self, kind: MessageKind) {
        tracing::trace!(owner = %self.owner, message = kind.as_str(), "gameplay message");
        self.messages.push(GameplayMessage::new(self.owner, kind));
    }

    /// Owner, spec and current prediction key, for errors raised on `handle`.
    pub(crate) fn error_context(&self, handle: AbilitySpecHandle) -> ErrorContext {
        let context = ErrorContext::new(self.owner).with_ability(handle);
        match self.prediction.current() {
            Some(key) => context.with_prediction_key(key),
            None => context,
        }
    }

    pub(crate) fn send(&mut self, request: NetRequest) {
        tracing::trace!(owner = %self.owner, request = request.as_str(), "queued net request");
        self.requests.push(request);
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advances continuations, then active effects, by `dt` seconds.
    pub fn tick(&mut self, dt: f32, env: &GameplayEnv<'_>) {
        self.advance_continuations(dt, env);
        self.advance_effects(dt, env);
        self.flush(env);
    }

    /// Re-initializes the avatar for a new life (respawn or reset).
    ///
    /// Authority only; the owning client follows through `ClientResetAvatar`.
    pub fn reset_avatar(&mut self, env: &GameplayEnv<'_>) {
        if !self.role.is_authority() {
            return;
        }
        self.reset_avatar_internal(env);
        self.flush(env);
    }

    pub(crate) fn reset_avatar_internal(&mut self, env: &GameplayEnv<'_>) {
        let transition = self.health.reset(&mut self.tags);
        tracing::debug!(owner = %self.owner, ?transition, "avatar reset");
        self.tags.set_count(GameplayTag::StateSpectating, 0);
        self.write_health_base();
        self.send(NetRequest::ClientResetAvatar {
            generation: self.health.generation(),
        });
        self.after_reset(env);
    }

    /// Removes one life from this owner (authority only).
    pub fn lose_life(&mut self, env: &GameplayEnv<'_>) -> bool {
        if !self.role.is_authority() || !self.attributes.has_set(AttributeSetKind::Lives) {
            return false;
        }
        let cause = ChangeCause::none();
        self.attributes
            .apply_instant(Attribute::Lives, crate::attribute::ModOp::Add, -1.0, &cause);
        self.flush(env);
        true
    }

    fn write_health_base(&mut self) {
        let values = self.health_base;
        let cause = ChangeCause::none();
        self.attributes
            .set_base(Attribute::MaxHealth, values.max_health, &cause);
        self.attributes
            .set_base(Attribute::Health, values.health, &cause);
        self.attributes
            .set_base(Attribute::Overhealth, values.overhealth, &cause);
    }

    /// Input and continuations that do not survive a new life.
    pub(crate) fn after_reset(&mut self, env: &GameplayEnv<'_>) {
        self.clear_ability_input();
        self.on_player_reset();
        self.activate_passives(env);
    }
}

impl PredictionHost for AbilitySystem {
    fn prediction_ledger(&mut self) -> &mut PredictionLedger {
        &mut self.prediction
    }
}

impl core::fmt::Debug for AbilitySystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AbilitySystem")
            .field("owner", &self.owner)
            .field("avatar", &self.avatar)
            .field("role", &self.role)
            .field("abilities", &self.specs.len())
            .field("effects", &self.effects.len())
            .field("death", &self.health.state())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::ability::AbilityDef;
    use crate::effect::{EffectDef, ExecutionKind, Magnitude, SetByCallerKey};
    use crate::env::{DefinitionTable, GameModeProperties, SpatialTable, TeamTable};
    use crate::ids::TeamId;

    pub const OWNER: ActorId = ActorId(1);
    pub const ENEMY: ActorId = ActorId(2);

    pub struct World {
        pub definitions: DefinitionTable,
        pub teams: TeamTable,
        pub mode: GameModeProperties,
        pub spatial: SpatialTable,
    }

    impl World {
        pub fn new() -> Self {
            let mut definitions = DefinitionTable::new();
            definitions.insert_effect(
                EffectDef::instant("ge.damage").with_execution(
                    ExecutionKind::Damage,
                    Magnitude::SetByCaller(SetByCallerKey::Damage),
                ),
            );
            definitions.insert_effect(
                EffectDef::timed("ge.cooldown", Magnitude::SetByCaller(SetByCallerKey::Duration))
                    .with_granted_tags(TagSet::COOLDOWN),
            );
            definitions.insert_ability(AbilityDef::death("ga.death"));
            Self {
                definitions,
                teams: TeamTable::new()
                    .with_member(OWNER, TeamId(0))
                    .with_member(ENEMY, TeamId(1)),
                mode: GameModeProperties::new(),
                spatial: SpatialTable::new(),
            }
        }

        pub fn env(&self) -> GameplayEnv<'_> {
            GameplayEnv::with_all(&self.definitions, &self.teams, &self.mode, &self.spatial)
        }

        pub fn ability(&self, id: &str) -> Arc<AbilityDef> {
            use crate::env::DefinitionOracle;
            self.definitions
                .ability(&crate::ability::AbilityId::new(id))
                .unwrap()
        }
    }

    /// Server-side system with a health set and an avatar.
    pub fn server(world: &World) -> AbilitySystem {
        let env = world.env();
        let mut system = AbilitySystem::new(OWNER, NetRole::Authority, GameplayConfig::default());
        system.init_health(HealthBaseValues::default(), &env);
        system.set_avatar(Some(OWNER), &env);
        system.set_gameplay_ready(true, &env);
        system
    }

    /// The owning client's copy of [`server`].
    pub fn client(world: &World) -> AbilitySystem {
        let env = world.env();
        let mut system =
            AbilitySystem::new(OWNER, NetRole::AutonomousProxy, GameplayConfig::default());
        system.init_health(HealthBaseValues::default(), &env);
        system.set_avatar(Some(OWNER), &env);
        system.set_gameplay_ready(true, &env);
        system
    }
}
