//! Gameplay ability core shared by the server and its clients.
//!
//! `gameplay-core` holds the per-owner rules of the ability system: clamped
//! attributes, timed and instant effects, the ability activation state
//! machine, the activation-group arbiter, client prediction with server
//! reconciliation and the health/death lifecycle. All state mutation flows
//! through [`system::AbilitySystem`]; the world it runs in is reached through
//! the oracle traits in [`env`].
//!
//! The crate is single-threaded and performs no I/O. Hosts drain messages,
//! net requests and outbound work after every call.
pub mod ability;
pub mod ability_set;
pub mod attribute;
pub mod config;
pub mod effect;
pub mod env;
pub mod error;
pub mod health;
pub mod ids;
pub mod message;
pub mod net;
pub mod prediction;
pub mod system;
pub mod tags;

pub use ability::{
    AbilityBehavior, AbilityCost, AbilityDef, AbilityId, AbilityInstance, AbilitySpec,
    AbilitySpecHandle, AbilityState, ActivationFailure, ActivationGroup, ActivationGroupArbiter,
    ActivationMethod, ArbiterError, CooldownConfig, GameplayEventData, InstancingPolicy,
    MeleeAttackDef, MeleeTargeting,
};
pub use ability_set::{AbilitySet, AbilitySetEffect, AbilitySetGrant, GrantedHandles};
pub use attribute::{
    Attribute, AttributeEvent, AttributeModifier, AttributeSetKind, AttributeSnapshot,
    AttributeStore, AttributeValue, ChangeCause, HealthBaseValues, ModOp,
};
pub use config::GameplayConfig;
pub use effect::{
    ActiveEffect, ActiveEffectContainer, ActiveEffectHandle, DurationPolicy, EffectApplication,
    EffectContext, EffectDef, EffectError, EffectId, EffectSpec, ExecutionKind, Magnitude,
    SetByCallerKey,
};
pub use env::{
    AvatarTransform, DefinitionOracle, DefinitionTable, Env, GameModeOracle, GameModeProperties,
    GameModeProperty, GameplayEnv, OracleError, SpatialOracle, SpatialTable, TeamComparison,
    TeamOracle, TeamTable,
};
pub use error::{ErrorContext, ErrorSeverity, GameplayError};
pub use health::{DeathState, DeathTransition, HealthComponent, ReplicatedDeathState};
pub use ids::{ActorId, MontageId, TeamId};
pub use message::{GameplayMessage, MessageKind};
pub use net::{NetExecutionPolicy, NetRequest, NetRole};
pub use prediction::{
    KeyStatus, PredictionError, PredictionHost, PredictionKey, PredictionLedger, RollbackAction,
    ScopedPredictionWindow,
};
pub use system::{AbilitySystem, CancelFilter, ConfigError, Outbound, ReplicatedState};
pub use tags::{GameplayTag, InputTag, TagCountContainer, TagSet};
