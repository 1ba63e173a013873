use crate::attribute::{Attribute, ModOp};
use crate::effect::EffectError;
use crate::tags::TagSet;

use super::{Execution, ExecutionOutput, ExecutionParams};

/// Turns captured damage into the target's Damage meta attribute.
///
/// Damage aimed at its own source is discarded unless the effect may damage
/// itself. Damage immunity zeroes the damage unless the effect is a self-destruct.
/// The result is scaled by source DamageBoost and target DamageResistance and
/// floored to a whole number.
#[derive(Clone, Copy, Debug, Default)]
pub struct DamageExecution;

impl Execution for DamageExecution {
    fn execute(&self, params: &ExecutionParams<'_>) -> Result<Option<ExecutionOutput>, EffectError> {
        let spec = params.spec;
        let tags = spec.asset_tags();
        let context = &spec.context;

        let targets_source =
            context.instigator == Some(params.target) || context.causer == Some(params.target);
        if targets_source && !tags.intersects(TagSet::CAN_DAMAGE_SELF | TagSet::SELF_DESTRUCT) {
            tracing::trace!(target_actor = %params.target, effect = %spec.def.id, "self damage discarded");
            return Ok(None);
        }

        if params.target_tags.contains(TagSet::IMMUNE_TO_DAMAGE)
            && !tags.contains(TagSet::SELF_DESTRUCT)
        {
            tracing::trace!(target_actor = %params.target, effect = %spec.def.id, "target immune to damage");
            return Ok(None);
        }

        let scaled = params.base_magnitude
            * (1.0 + spec.captured_damage_boost)
            * (1.0 - params.target_damage_resistance);
        let damage = scaled.floor();
        if damage > 0.0 {
            Ok(Some(ExecutionOutput {
                attribute: Attribute::Damage,
                op: ModOp::Add,
                magnitude: damage,
            }))
        } else {
            Ok(None)
        }
    }
}
