//! Session configuration.

use std::env;
use std::path::PathBuf;

/// Runtime configuration of one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Ticks a message spends on the replication link. Clamped to at least one.
    pub latency_ticks: u64,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    /// Directory holding the content data files.
    pub data_dir: PathBuf,
    /// Game mode asset loaded from `data_dir/game_modes`.
    pub game_mode: String,
    /// Directory for the harness log file; stdout only when unset.
    pub log_dir: Option<PathBuf>,
}

impl SessionConfig {
    pub const DEFAULT_TICK_RATE: u32 = 30;
    pub const DEFAULT_LATENCY_TICKS: u64 = 3;
    pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;
    pub const DEFAULT_GAME_MODE: &'static str = "elimination";

    /// Loads configuration from `GAMEPLAY_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file. Unset or
    /// unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(rate) = read_env::<u32>("GAMEPLAY_TICK_RATE") {
            config.tick_rate = rate.max(1);
        }
        if let Some(latency) = read_env::<u64>("GAMEPLAY_LATENCY_TICKS") {
            config.latency_ticks = latency;
        }
        if let Some(capacity) = read_env::<usize>("GAMEPLAY_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Ok(dir) = env::var("GAMEPLAY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(mode) = env::var("GAMEPLAY_GAME_MODE") {
            config.game_mode = mode;
        }
        config.log_dir = env::var("GAMEPLAY_LOG_DIR").ok().map(PathBuf::from);

        config
    }

    pub fn with_game_mode(mut self, game_mode: impl Into<String>) -> Self {
        self.game_mode = game_mode.into();
        self
    }

    pub fn with_latency(mut self, ticks: u64) -> Self {
        self.latency_ticks = ticks;
        self
    }

    /// Seconds simulated by one tick.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: Self::DEFAULT_TICK_RATE,
            latency_ticks: Self::DEFAULT_LATENCY_TICKS,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER_SIZE,
            data_dir: PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../gameplay/content/data"
            )),
            game_mode: Self::DEFAULT_GAME_MODE.to_owned(),
            log_dir: None,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_seconds_follow_the_rate() {
        let config = SessionConfig {
            tick_rate: 20,
            ..SessionConfig::default()
        };
        assert_eq!(config.tick_seconds(), 0.05);
    }

    #[test]
    fn default_data_dir_points_at_the_shipped_content() {
        let config = SessionConfig::default();
        assert!(config.data_dir.join("config.toml").exists());
    }
}
