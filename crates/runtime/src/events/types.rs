//! Event payloads published by the session itself.

use gameplay_core::{ActorId, TeamId};
use serde::{Deserialize, Serialize};

use crate::player::InitState;

/// Which copy of an ability system produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Peer {
    Server,
    Client,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TeamEvent {
    /// The actor's team tag changed.
    Assigned {
        actor: ActorId,
        team: TeamId,
        previous: Option<TeamId>,
    },
    Removed {
        actor: ActorId,
        team: TeamId,
    },
    /// A death cost every member of `team` one life.
    LifeLost {
        team: TeamId,
        died: ActorId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    Joined { actor: ActorId, pawn: String },
    Left { actor: ActorId },
    InitStateChanged { actor: ActorId, state: InitState },
    GameFeatureActivated { feature: String },
    GameFeatureDeactivated { feature: String },
}
