//! Players of a session and their initialization chain.

use gameplay_core::{AbilitySystem, ActorId, GameplayConfig, GrantedHandles, NetRole, TeamId};
use serde::{Deserialize, Serialize};

/// Ordered initialization states of a player.
///
/// A player moves one step at a time and only when the step's
/// preconditions hold:
/// - `DataAvailable`: the game mode is loaded and the pawn data resolved
/// - `DataInitialized`: health, attribute sets and pawn ability sets applied
/// - `GameplayReady`: avatar bound; passive abilities may activate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InitState {
    Spawned,
    DataAvailable,
    DataInitialized,
    GameplayReady,
}

impl InitState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Spawned => Some(Self::DataAvailable),
            Self::DataAvailable => Some(Self::DataInitialized),
            Self::DataInitialized => Some(Self::GameplayReady),
            Self::GameplayReady => None,
        }
    }
}

/// One connected player: the authoritative ability system on the server and
/// the predicting copy on the player's own client.
pub struct Player {
    pub(crate) id: ActorId,
    pub(crate) team: TeamId,
    pub(crate) pawn: String,
    pub(crate) init: InitState,
    pub(crate) server: AbilitySystem,
    pub(crate) client: AbilitySystem,
    pub(crate) pawn_grants: Vec<GrantedHandles>,
}

impl Player {
    pub(crate) fn new(id: ActorId, team: TeamId, pawn: String, config: &GameplayConfig) -> Self {
        Self {
            id,
            team,
            pawn,
            init: InitState::Spawned,
            server: AbilitySystem::new(id, NetRole::Authority, config.clone()),
            client: AbilitySystem::new(id, NetRole::AutonomousProxy, config.clone()),
            pawn_grants: Vec::new(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn pawn(&self) -> &str {
        &self.pawn
    }

    pub fn init_state(&self) -> InitState {
        self.init
    }

    pub fn is_ready(&self) -> bool {
        self.init == InitState::GameplayReady
    }

    /// The authoritative copy.
    pub fn server(&self) -> &AbilitySystem {
        &self.server
    }

    /// The owning client's predicting copy.
    pub fn client(&self) -> &AbilitySystem {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_advance_in_order() {
        let mut state = InitState::Spawned;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            state = next;
            visited.push(state);
        }
        assert_eq!(visited.len(), 4);
        assert_eq!(state, InitState::GameplayReady);
    }
}
