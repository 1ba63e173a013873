//! Traits describing the world the ability core runs in.
//!
//! Oracles expose definitions, team membership, game-mode properties and
//! avatar positions. The [`Env`] aggregate bundles them so the ability system
//! reaches everything it needs without global lookups.
mod definitions;
mod error;
mod game_mode;
mod spatial;
mod teams;

pub use definitions::{DefinitionOracle, DefinitionTable};
pub use error::OracleError;
pub use game_mode::{GameModeOracle, GameModeProperties, GameModeProperty};
pub use spatial::{AvatarTransform, SpatialOracle, SpatialTable};
pub use teams::{TeamComparison, TeamOracle, TeamTable};

/// Aggregates the read-only oracles used by the ability system.
pub struct Env<'a, D, T, G, S>
where
    D: DefinitionOracle + ?Sized,
    T: TeamOracle + ?Sized,
    G: GameModeOracle + ?Sized,
    S: SpatialOracle + ?Sized,
{
    definitions: Option<&'a D>,
    teams: Option<&'a T>,
    game_mode: Option<&'a G>,
    spatial: Option<&'a S>,
}

pub type GameplayEnv<'a> = Env<
    'a,
    dyn DefinitionOracle + 'a,
    dyn TeamOracle + 'a,
    dyn GameModeOracle + 'a,
    dyn SpatialOracle + 'a,
>;

// Manual impls: derives would require the oracle trait objects themselves to be Clone/Debug.
impl<D, T, G, S> Clone for Env<'_, D, T, G, S>
where
    D: DefinitionOracle + ?Sized,
    T: TeamOracle + ?Sized,
    G: GameModeOracle + ?Sized,
    S: SpatialOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, T, G, S> Copy for Env<'_, D, T, G, S>
where
    D: DefinitionOracle + ?Sized,
    T: TeamOracle + ?Sized,
    G: GameModeOracle + ?Sized,
    S: SpatialOracle + ?Sized,
{
}

impl<D, T, G, S> core::fmt::Debug for Env<'_, D, T, G, S>
where
    D: DefinitionOracle + ?Sized,
    T: TeamOracle + ?Sized,
    G: GameModeOracle + ?Sized,
    S: SpatialOracle + ?Sized,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Env")
            .field("definitions", &self.definitions.is_some())
            .field("teams", &self.teams.is_some())
            .field("game_mode", &self.game_mode.is_some())
            .field("spatial", &self.spatial.is_some())
            .finish()
    }
}

impl<'a, D, T, G, S> Env<'a, D, T, G, S>
where
    D: DefinitionOracle + ?Sized,
    T: TeamOracle + ?Sized,
    G: GameModeOracle + ?Sized,
    S: SpatialOracle + ?Sized,
{
    pub fn new(
        definitions: Option<&'a D>,
        teams: Option<&'a T>,
        game_mode: Option<&'a G>,
        spatial: Option<&'a S>,
    ) -> Self {
        Self {
            definitions,
            teams,
            game_mode,
            spatial,
        }
    }

    pub fn with_all(definitions: &'a D, teams: &'a T, game_mode: &'a G, spatial: &'a S) -> Self {
        Self::new(Some(definitions), Some(teams), Some(game_mode), Some(spatial))
    }

    pub fn empty() -> Self {
        Self {
            definitions: None,
            teams: None,
            game_mode: None,
            spatial: None,
        }
    }

    /// Returns the DefinitionOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::DefinitionsNotAvailable` if no definitions were provided.
    pub fn definitions(&self) -> Result<&'a D, OracleError> {
        self.definitions.ok_or(OracleError::DefinitionsNotAvailable)
    }

    /// Returns the TeamOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::TeamsNotAvailable` if no team oracle was provided.
    pub fn teams(&self) -> Result<&'a T, OracleError> {
        self.teams.ok_or(OracleError::TeamsNotAvailable)
    }

    /// Returns the GameModeOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::GameModeNotAvailable` if no game mode is loaded.
    pub fn game_mode(&self) -> Result<&'a G, OracleError> {
        self.game_mode.ok_or(OracleError::GameModeNotAvailable)
    }

    /// Returns the SpatialOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpatialNotAvailable` if no spatial oracle was provided.
    pub fn spatial(&self) -> Result<&'a S, OracleError> {
        self.spatial.ok_or(OracleError::SpatialNotAvailable)
    }

    /// Game-mode property, or `None` if no game mode is loaded or it does not set the property.
    pub fn game_mode_property(&self, property: GameModeProperty) -> Option<f32> {
        self.game_mode.and_then(|mode| mode.property(property))
    }
}

impl<'a, D, T, G, S> Env<'a, D, T, G, S>
where
    D: DefinitionOracle + 'a,
    T: TeamOracle + 'a,
    G: GameModeOracle + 'a,
    S: SpatialOracle + 'a,
{
    /// Converts this environment into a trait-object based `GameplayEnv`.
    pub fn as_gameplay_env(&self) -> GameplayEnv<'a> {
        let definitions: Option<&'a dyn DefinitionOracle> = self.definitions.map(|d| d as _);
        let teams: Option<&'a dyn TeamOracle> = self.teams.map(|t| t as _);
        let game_mode: Option<&'a dyn GameModeOracle> = self.game_mode.map(|g| g as _);
        let spatial: Option<&'a dyn SpatialOracle> = self.spatial.map(|s| s as _);
        Env::new(definitions, teams, game_mode, spatial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_oracles_surface_as_errors() {
        let env = GameplayEnv::empty();
        assert_eq!(
            env.definitions().err(),
            Some(OracleError::DefinitionsNotAvailable)
        );
        assert_eq!(env.teams().err(), Some(OracleError::TeamsNotAvailable));
        assert_eq!(env.game_mode_property(GameModeProperty::RespawnTime), None);
    }

    #[test]
    fn concrete_env_converts_to_trait_objects() {
        let definitions = DefinitionTable::new();
        let teams = TeamTable::new();
        let mode = GameModeProperties::new().with(GameModeProperty::RespawnTime, 3.0);
        let spatial = SpatialTable::new();
        let env = Env::with_all(&definitions, &teams, &mode, &spatial).as_gameplay_env();
        assert_eq!(env.game_mode_property(GameModeProperty::RespawnTime), Some(3.0));
        assert!(env.spatial().is_ok());
    }
}
