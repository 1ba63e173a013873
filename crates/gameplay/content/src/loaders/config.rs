//! Gameplay configuration loader.

use std::path::Path;

use gameplay_core::GameplayConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for gameplay configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to the [`GameplayConfig`] defaults.
    pub fn load(path: &Path) -> LoadResult<GameplayConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<GameplayConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
