//! Game mode loader.

use std::path::Path;

use crate::formats::GameModeData;
use crate::loaders::{LoadResult, read_file};

/// Loader for one game mode from a RON file.
///
/// # RON Format
///
/// ```ron
/// (
///     name: "elimination",
///     default_pawn: "hero",
///     team_count: 2,
///     properties: (values: {RespawnTime: 5.0, StartingLives: 3.0}),
///     features: [(name: "feature.ultimates", ability_sets: ["as.ultimates"])],
/// )
/// ```
pub struct GameModeLoader;

impl GameModeLoader {
    pub fn load(path: &Path) -> LoadResult<GameModeData> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameModeData> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse game mode RON: {}", e))
    }
}
