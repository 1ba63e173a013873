//! Effect domain: definitions, specs, active effects and executions.
//!
//! An [`EffectDef`] is authored data. Building an [`EffectSpec`] binds it to a
//! level, an [`EffectContext`] and caller-supplied magnitudes. Instant specs
//! change base values (through executions and modifiers); timed and infinite
//! specs live in the [`ActiveEffectContainer`] until they expire or are removed.

mod active;
mod context;
mod def;
mod error;
pub mod execution;
mod spec;

pub use active::{
    ActiveEffect, ActiveEffectContainer, ActiveEffectHandle, AdvanceOutcome, RemovalListener,
};
pub use context::EffectContext;
pub use def::{
    DurationPolicy, EffectDef, EffectId, ExecutionDef, ExecutionKind, Magnitude, ModifierInfo,
    SetByCallerKey,
};
pub use error::EffectError;
pub use execution::{Execution, ExecutionOutput, ExecutionParams};
pub use spec::{EffectSpec, ResolvedDuration};

/// Result of applying a spec to an owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectApplication {
    /// Stored effect; the handle removes it.
    Applied(ActiveEffectHandle),
    /// Instant effect ran; `magnitude` is the folded execution output, if any.
    Executed { magnitude: f32 },
    /// Nothing happened (no authority, no valid prediction key).
    Rejected,
}

impl EffectApplication {
    pub fn handle(self) -> Option<ActiveEffectHandle> {
        match self {
            Self::Applied(handle) => Some(handle),
            _ => None,
        }
    }
}
