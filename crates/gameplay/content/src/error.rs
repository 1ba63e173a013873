//! Errors found while cross-checking loaded content.
//!
//! Parse and I/O failures are reported by the loaders through `anyhow`; this
//! type covers content that parses fine but refers to things that do not exist.

use gameplay_core::{AbilityId, EffectId, ErrorSeverity, GameplayError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("{kind} '{id}' is defined more than once")]
    DuplicateId { kind: &'static str, id: String },

    #[error("'{referrer}' refers to unknown effect '{effect}'")]
    UnknownEffect { referrer: String, effect: EffectId },

    #[error("'{referrer}' refers to unknown ability '{ability}'")]
    UnknownAbility { referrer: String, ability: AbilityId },

    #[error("'{referrer}' refers to unknown ability set '{set}'")]
    UnknownAbilitySet { referrer: String, set: String },

    #[error("game mode '{mode}' uses unknown pawn '{pawn}'")]
    UnknownPawn { mode: String, pawn: String },

    #[error("game mode '{mode}' needs at least one team")]
    NoTeams { mode: String },
}

impl GameplayError for ContentError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "CONTENT_DUPLICATE_ID",
            Self::UnknownEffect { .. } => "CONTENT_UNKNOWN_EFFECT",
            Self::UnknownAbility { .. } => "CONTENT_UNKNOWN_ABILITY",
            Self::UnknownAbilitySet { .. } => "CONTENT_UNKNOWN_ABILITY_SET",
            Self::UnknownPawn { .. } => "CONTENT_UNKNOWN_PAWN",
            Self::NoTeams { .. } => "CONTENT_NO_TEAMS",
        }
    }
}
