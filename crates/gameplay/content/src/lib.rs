//! Data-driven gameplay content and its loaders.
//!
//! This crate holds the authored side of the ability system and reads it from
//! RON/TOML data files:
//! - Effect and ability definitions (RON)
//! - Ability sets granted by pawns and game features (RON)
//! - Pawn data: health base values, attribute sets, default ability sets (RON)
//! - Game modes: properties, default pawn, game features (RON)
//! - Core gameplay configuration (TOML)
//!
//! Content is consumed by the runtime session and handed to the core through
//! its oracle traits; none of it is replicated.

pub mod error;
pub mod formats;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use error::ContentError;
pub use formats::{ContentBundle, GameFeatureData, GameModeData, PawnData};

#[cfg(feature = "loaders")]
pub use loaders::{
    AbilityLoader, AbilitySetLoader, ConfigLoader, ContentFactory, EffectLoader, GameModeLoader,
    LoadResult, PawnLoader,
};
