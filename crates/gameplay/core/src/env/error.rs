//! Oracle access errors.

use crate::ability::AbilityId;
use crate::effect::EffectId;
use crate::error::{ErrorSeverity, GameplayError};

/// Errors that occur when the core asks its environment for data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("DefinitionOracle not available")]
    DefinitionsNotAvailable,

    #[error("TeamOracle not available")]
    TeamsNotAvailable,

    #[error("GameModeOracle not available")]
    GameModeNotAvailable,

    #[error("SpatialOracle not available")]
    SpatialNotAvailable,

    #[error("ability definition '{0}' not found")]
    AbilityNotFound(AbilityId),

    #[error("effect definition '{0}' not found")]
    EffectNotFound(EffectId),
}

impl GameplayError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            // Missing oracles are fatal: the call can never succeed in this environment
            DefinitionsNotAvailable | TeamsNotAvailable | GameModeNotAvailable
            | SpatialNotAvailable => ErrorSeverity::Fatal,

            AbilityNotFound(_) | EffectNotFound(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            DefinitionsNotAvailable => "ORACLE_DEFINITIONS_NOT_AVAILABLE",
            TeamsNotAvailable => "ORACLE_TEAMS_NOT_AVAILABLE",
            GameModeNotAvailable => "ORACLE_GAME_MODE_NOT_AVAILABLE",
            SpatialNotAvailable => "ORACLE_SPATIAL_NOT_AVAILABLE",
            AbilityNotFound(_) => "ORACLE_ABILITY_NOT_FOUND",
            EffectNotFound(_) => "ORACLE_EFFECT_NOT_FOUND",
        }
    }
}
