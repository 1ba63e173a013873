/// Gameplay configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameplayConfig {
    /// Seconds between death and respawn when the game mode does not say otherwise.
    pub default_respawn_time: f32,

    /// Seconds a death ability stays active before the death is finished.
    pub default_death_duration: f32,

    /// Ultimate charge multiplier when the game mode does not provide one.
    pub default_ultimate_charge_rate: f32,
}

impl GameplayConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of "remove on end" effect handles one ability instance retains.
    pub const MAX_RETAINED_EFFECTS: usize = 8;
    /// Maximum number of rollback actions bound to one prediction key.
    pub const MAX_ROLLBACKS_PER_KEY: usize = 4;
    /// Maximum number of abilities granted to one owner.
    pub const MAX_ABILITIES: usize = 32;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_RESPAWN_TIME: f32 = 5.0;
    pub const DEFAULT_DEATH_DURATION: f32 = 2.0;
    pub const DEFAULT_ULTIMATE_CHARGE_RATE: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            default_respawn_time: Self::DEFAULT_RESPAWN_TIME,
            default_death_duration: Self::DEFAULT_DEATH_DURATION,
            default_ultimate_charge_rate: Self::DEFAULT_ULTIMATE_CHARGE_RATE,
        }
    }

    pub fn with_respawn_time(mut self, seconds: f32) -> Self {
        self.default_respawn_time = seconds;
        self
    }

    pub fn with_death_duration(mut self, seconds: f32) -> Self {
        self.default_death_duration = seconds;
        self
    }
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self::new()
    }
}
