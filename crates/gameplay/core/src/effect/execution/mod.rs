//! Custom calculations run when an effect with an execution is applied.
//!
//! An execution reads the captured magnitude and the target's state and
//! produces at most one attribute delta. Executions only run with authority.

mod damage;
mod healing;
mod overhealth;

pub use damage::DamageExecution;
pub use healing::HealingExecution;
pub use overhealth::OverhealthExecution;

use crate::attribute::{Attribute, ModOp};
use crate::env::TeamOracle;
use crate::ids::ActorId;
use crate::tags::TagSet;

use super::{EffectError, EffectSpec, ExecutionKind};

/// Everything an execution may read.
pub struct ExecutionParams<'a> {
    pub spec: &'a EffectSpec,
    /// Magnitude captured from the spec, before any scaling.
    pub base_magnitude: f32,
    pub target: ActorId,
    pub target_tags: TagSet,
    pub target_damage_resistance: f32,
    pub teams: Option<&'a dyn TeamOracle>,
}

/// The delta an execution asks the target's store to apply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExecutionOutput {
    pub attribute: Attribute,
    pub op: ModOp,
    pub magnitude: f32,
}

pub trait Execution {
    /// Computes the output, or `None` when nothing should change.
    fn execute(&self, params: &ExecutionParams<'_>) -> Result<Option<ExecutionOutput>, EffectError>;
}

/// Execution implementing `kind`.
pub fn execution_for(kind: ExecutionKind) -> &'static dyn Execution {
    match kind {
        ExecutionKind::Damage => &DamageExecution,
        ExecutionKind::Healing => &HealingExecution,
        ExecutionKind::Overhealth => &OverhealthExecution,
    }
}
