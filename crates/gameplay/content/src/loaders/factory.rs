//! Content factory for building a session's content from data files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gameplay_core::{AbilityDef, AbilitySet, DefinitionTable, EffectDef, GameplayConfig};

use crate::formats::{ContentBundle, GameModeData, PawnData};
use crate::loaders::{
    AbilityLoader, AbilitySetLoader, ConfigLoader, EffectLoader, GameModeLoader, LoadResult,
    PawnLoader, index_by_name,
};

/// Content factory that loads all gameplay content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── effects.ron
/// ├── abilities.ron
/// ├── ability_sets.ron
/// ├── pawns.ron
/// └── game_modes/
///     ├── elimination.ron
///     └── practice.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load gameplay configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<GameplayConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load effect definitions from `effects.ron`.
    pub fn load_effects(&self) -> LoadResult<Vec<EffectDef>> {
        EffectLoader::load(&self.data_dir.join("effects.ron"))
    }

    /// Load ability definitions from `abilities.ron`.
    pub fn load_abilities(&self) -> LoadResult<Vec<AbilityDef>> {
        AbilityLoader::load(&self.data_dir.join("abilities.ron"))
    }

    /// Load ability sets from `ability_sets.ron`.
    pub fn load_ability_sets(&self) -> LoadResult<Vec<AbilitySet>> {
        AbilitySetLoader::load(&self.data_dir.join("ability_sets.ron"))
    }

    /// Load pawn data from `pawns.ron`.
    pub fn load_pawns(&self) -> LoadResult<Vec<PawnData>> {
        PawnLoader::load(&self.data_dir.join("pawns.ron"))
    }

    /// Load a game mode from `game_modes/{name}.ron`.
    pub fn load_game_mode(&self, name: &str) -> LoadResult<GameModeData> {
        let path = self.data_dir.join("game_modes").join(format!("{}.ron", name));
        GameModeLoader::load(&path)
    }

    /// Load effects and abilities into one definition table.
    ///
    /// Duplicate ids are rejected rather than silently overwritten.
    pub fn load_definitions(&self) -> LoadResult<DefinitionTable> {
        let effects = index_by_name("effect", self.load_effects()?, |e| e.id.as_str())?;
        let abilities = index_by_name("ability", self.load_abilities()?, |a| a.id.as_str())?;

        let mut table = DefinitionTable::new();
        for effect in effects.into_values() {
            table.insert_effect(effect);
        }
        for ability in abilities.into_values() {
            table.insert_ability(ability);
        }
        Ok(table)
    }

    /// Load everything a session needs for `game_mode` and cross-check it.
    pub fn load_bundle(&self, game_mode: &str) -> LoadResult<ContentBundle> {
        let config = self.load_config()?;
        let definitions = self.load_definitions()?;
        let ability_sets: BTreeMap<String, AbilitySet> =
            index_by_name("ability set", self.load_ability_sets()?, |s| s.name.as_str())?;
        let pawns: BTreeMap<String, PawnData> =
            index_by_name("pawn", self.load_pawns()?, |p| p.name.as_str())?;
        let game_mode = self
            .load_game_mode(game_mode)
            .with_context(|| format!("Failed to load game mode '{}'", game_mode))?;

        let bundle = ContentBundle {
            config,
            definitions,
            ability_sets,
            pawns,
            game_mode,
        };
        bundle
            .validate()
            .with_context(|| format!("Invalid content in {}", self.data_dir.display()))?;
        Ok(bundle)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
