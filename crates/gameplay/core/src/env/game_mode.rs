//! Game-mode properties exposed to abilities.

use std::collections::BTreeMap;

/// Numeric properties a game mode may override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameModeProperty {
    /// Seconds between death and respawn.
    RespawnTime,
    /// Lives each team starts with.
    StartingLives,
    /// Multiplier applied to ultimate charge gains.
    UltimateChargeRate,
    /// Seconds the death ability stays active.
    DeathDuration,
}

/// Provides the properties of the active game mode.
pub trait GameModeOracle: Send + Sync {
    /// Returns the property value, or `None` if the game mode does not set it.
    fn property(&self, property: GameModeProperty) -> Option<f32>;
}

/// Property map of one game mode.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameModeProperties {
    values: BTreeMap<GameModeProperty, f32>,
}

impl GameModeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: GameModeProperty, value: f32) -> Self {
        self.values.insert(property, value);
        self
    }

    pub fn set(&mut self, property: GameModeProperty, value: f32) {
        self.values.insert(property, value);
    }
}

impl GameModeOracle for GameModeProperties {
    fn property(&self, property: GameModeProperty) -> Option<f32> {
        self.values.get(&property).copied()
    }
}
