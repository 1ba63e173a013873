use crate::attribute::{Attribute, ModOp};
use crate::effect::EffectError;
use crate::env::OracleError;

use super::{Execution, ExecutionOutput, ExecutionParams};

/// Turns captured healing into the target's Healing meta attribute.
///
/// Healing only lands on the instigator itself or its teammates.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealingExecution;

impl Execution for HealingExecution {
    fn execute(&self, params: &ExecutionParams<'_>) -> Result<Option<ExecutionOutput>, EffectError> {
        let eligible = match params.spec.context.instigator {
            None => true,
            Some(instigator) if instigator == params.target => true,
            Some(instigator) => params
                .teams
                .ok_or(OracleError::TeamsNotAvailable)?
                .can_cause_healing(instigator, params.target),
        };
        let factor = if eligible { 1.0 } else { 0.0 };

        let healing = (params.base_magnitude * factor).floor();
        if healing > 0.0 {
            Ok(Some(ExecutionOutput {
                attribute: Attribute::Healing,
                op: ModOp::Add,
                magnitude: healing,
            }))
        } else {
            Ok(None)
        }
    }
}
