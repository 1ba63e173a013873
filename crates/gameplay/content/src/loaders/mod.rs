//! Content loaders for reading gameplay data from files.
//!
//! Each loader turns one RON/TOML file into the types of
//! [`gameplay_core`] or [`crate::formats`]. [`ContentFactory`] ties them
//! together into a validated [`crate::ContentBundle`].

pub mod abilities;
pub mod ability_sets;
pub mod config;
pub mod effects;
pub mod factory;
pub mod game_mode;
pub mod pawns;

pub use abilities::AbilityLoader;
pub use ability_sets::AbilitySetLoader;
pub use config::ConfigLoader;
pub use effects::EffectLoader;
pub use factory::ContentFactory;
pub use game_mode::GameModeLoader;
pub use pawns::PawnLoader;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ContentError;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Keys `items` by name, rejecting duplicates.
pub(crate) fn index_by_name<T>(
    kind: &'static str,
    items: Vec<T>,
    name: impl Fn(&T) -> &str,
) -> Result<BTreeMap<String, T>, ContentError> {
    let mut index = BTreeMap::new();
    for item in items {
        let key = name(&item).to_owned();
        if index.contains_key(&key) {
            return Err(ContentError::DuplicateId { kind, id: key });
        }
        index.insert(key, item);
    }
    Ok(index)
}
