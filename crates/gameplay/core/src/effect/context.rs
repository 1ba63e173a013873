use crate::ability::AbilitySpecHandle;
use crate::attribute::ChangeCause;
use crate::ids::ActorId;
use crate::prediction::PredictionKey;

use super::EffectId;

/// Who applied an effect and on whose behalf.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectContext {
    /// Ability-owner ultimately responsible.
    pub instigator: Option<ActorId>,
    /// Actor that physically caused the effect (avatar, projectile).
    pub causer: Option<ActorId>,
    pub source_ability: Option<AbilitySpecHandle>,
    pub prediction_key: Option<PredictionKey>,
}

impl EffectContext {
    pub fn new(instigator: ActorId) -> Self {
        Self {
            instigator: Some(instigator),
            causer: Some(instigator),
            source_ability: None,
            prediction_key: None,
        }
    }

    pub fn with_causer(mut self, causer: ActorId) -> Self {
        self.causer = Some(causer);
        self
    }

    pub fn with_source_ability(mut self, ability: AbilitySpecHandle) -> Self {
        self.source_ability = Some(ability);
        self
    }

    pub(crate) fn cause(&self, effect: &EffectId) -> ChangeCause {
        ChangeCause {
            instigator: self.instigator,
            causer: self.causer,
            effect: Some(effect.clone()),
        }
    }
}
