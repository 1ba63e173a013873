//! Errors surfaced by the session API.

use thiserror::Error;

use gameplay_core::{
    AbilityId, ActivationFailure, ActorId, EffectError, ErrorSeverity, GameplayError,
};

use crate::player::InitState;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to load content: {0:#}")]
    Content(anyhow::Error),

    #[error("no player {0} in this session")]
    UnknownPlayer(ActorId),

    #[error("{actor} has no ability '{ability}'")]
    UnknownAbility { actor: ActorId, ability: AbilityId },

    #[error("{actor} is still {state:?}")]
    NotReady { actor: ActorId, state: InitState },

    #[error("pawn '{0}' is not defined")]
    UnknownPawn(String),

    #[error(transparent)]
    Activation(#[from] ActivationFailure),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("replication link codec failed")]
    Codec(#[from] bincode::Error),
}

impl GameplayError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Content(_) | Self::UnknownPawn(_) => ErrorSeverity::Fatal,
            Self::UnknownPlayer(_) | Self::UnknownAbility { .. } | Self::NotReady { .. } => {
                ErrorSeverity::Validation
            }
            Self::Activation(_) => ErrorSeverity::Recoverable,
            Self::Effect(err) => err.severity(),
            Self::Codec(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Content(_) => "RUNTIME_CONTENT",
            Self::UnknownPlayer(_) => "RUNTIME_UNKNOWN_PLAYER",
            Self::UnknownAbility { .. } => "RUNTIME_UNKNOWN_ABILITY",
            Self::NotReady { .. } => "RUNTIME_NOT_READY",
            Self::UnknownPawn(_) => "RUNTIME_UNKNOWN_PAWN",
            Self::Activation(_) => "RUNTIME_ACTIVATION",
            Self::Effect(err) => err.error_code(),
            Self::Codec(_) => "RUNTIME_CODEC",
        }
    }
}
