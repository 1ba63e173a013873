use crate::attribute::{Attribute, ModOp};
use crate::effect::EffectError;

use super::{Execution, ExecutionOutput, ExecutionParams};

/// Passes the captured magnitude straight into Overhealth.
///
/// Only grants: a zero or negative magnitude does nothing. Overhealth is
/// drained through the OverhealthDecay meta attribute instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverhealthExecution;

impl Execution for OverhealthExecution {
    fn execute(&self, params: &ExecutionParams<'_>) -> Result<Option<ExecutionOutput>, EffectError> {
        if params.base_magnitude <= 0.0 {
            return Ok(None);
        }
        Ok(Some(ExecutionOutput {
            attribute: Attribute::Overhealth,
            op: ModOp::Add,
            magnitude: params.base_magnitude,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::execution::test_support::{params, spec_from};
    use crate::effect::{EffectDef, ExecutionKind, Magnitude};
    use crate::ids::ActorId;

    #[test]
    fn passes_magnitude_through_unfloored() {
        let def = EffectDef::instant("ge.shield")
            .with_execution(ExecutionKind::Overhealth, Magnitude::flat(0.0));
        let spec = spec_from(ActorId(1), def);
        let out = OverhealthExecution
            .execute(&params(&spec, 25.5, ActorId(4)))
            .unwrap()
            .unwrap();
        assert_eq!(out.attribute, Attribute::Overhealth);
        assert_eq!(out.magnitude, 25.5);
    }

    #[test]
    fn negative_magnitude_grants_nothing() {
        let def = EffectDef::instant("ge.shield")
            .with_execution(ExecutionKind::Overhealth, Magnitude::flat(0.0));
        let spec = spec_from(ActorId(1), def);
        assert_eq!(
            OverhealthExecution
                .execute(&params(&spec, -30.0, ActorId(4)))
                .unwrap(),
            None
        );
    }
}
