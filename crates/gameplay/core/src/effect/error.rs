//! Effect application errors.

use crate::attribute::AttributeSetKind;
use crate::env::OracleError;
use crate::error::{ErrorSeverity, GameplayError};

use super::{EffectId, SetByCallerKey};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect '{effect}' targets the {set:?} attribute set, which the target does not have")]
    MissingAttributeSet {
        effect: EffectId,
        set: AttributeSetKind,
    },

    #[error("effect '{effect}' needs a set-by-caller magnitude for {key:?}")]
    MissingSetByCaller {
        effect: EffectId,
        key: SetByCallerKey,
    },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl GameplayError for EffectError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingAttributeSet { .. } => ErrorSeverity::Validation,
            Self::MissingSetByCaller { .. } => ErrorSeverity::Fatal,
            Self::Oracle(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAttributeSet { .. } => "EFFECT_MISSING_ATTRIBUTE_SET",
            Self::MissingSetByCaller { .. } => "EFFECT_MISSING_SET_BY_CALLER",
            Self::Oracle(err) => err.error_code(),
        }
    }
}
