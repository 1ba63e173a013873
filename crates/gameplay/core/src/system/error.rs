use crate::ability::AbilityId;
use crate::effect::{EffectError, EffectId};
use crate::error::{ErrorContext, ErrorSeverity, GameplayError};

/// Content that cannot work as authored.
///
/// These are logged where they are found; the offending step is skipped and
/// the rest of the activation carries on. Each carries the owner, spec handle
/// and prediction key of the activation that tripped over it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cooldown of '{ability}' sets a duration but '{effect}' does not read a set-by-caller duration")]
    CooldownDurationMisconfigured {
        ability: AbilityId,
        effect: EffectId,
        context: ErrorContext,
    },

    #[error("cooldown of '{ability}' has a non-positive duration {duration}")]
    NonPositiveCooldown {
        ability: AbilityId,
        duration: f32,
        context: ErrorContext,
    },

    #[error("'{ability}' is not instanced and cannot keep effects removed on end")]
    RetainedEffectsOnNonInstanced {
        ability: AbilityId,
        context: ErrorContext,
    },

    #[error("'{ability}' keeps more effects than an instance can hold")]
    RetainedEffectCapacity {
        ability: AbilityId,
        context: ErrorContext,
    },

    #[error(transparent)]
    Effect(#[from] EffectError),
}

impl GameplayError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CooldownDurationMisconfigured { .. } | Self::NonPositiveCooldown { .. } => {
                ErrorSeverity::Fatal
            }
            Self::RetainedEffectsOnNonInstanced { .. } => ErrorSeverity::Validation,
            Self::RetainedEffectCapacity { .. } => ErrorSeverity::Internal,
            Self::Effect(err) => err.severity(),
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::CooldownDurationMisconfigured { context, .. }
            | Self::NonPositiveCooldown { context, .. }
            | Self::RetainedEffectsOnNonInstanced { context, .. }
            | Self::RetainedEffectCapacity { context, .. } => Some(context),
            Self::Effect(err) => err.context(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CooldownDurationMisconfigured { .. } => "CONFIG_COOLDOWN_DURATION",
            Self::NonPositiveCooldown { .. } => "CONFIG_COOLDOWN_NON_POSITIVE",
            Self::RetainedEffectsOnNonInstanced { .. } => "CONFIG_RETAINED_NON_INSTANCED",
            Self::RetainedEffectCapacity { .. } => "CONFIG_RETAINED_CAPACITY",
            Self::Effect(err) => err.error_code(),
        }
    }
}
