//! Pawn data loader.

use std::path::Path;

use crate::formats::PawnData;
use crate::loaders::{LoadResult, read_file};

/// Loader for pawn data from a RON list.
pub struct PawnLoader;

impl PawnLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<PawnData>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<PawnData>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse pawns RON: {}", e))
    }
}
