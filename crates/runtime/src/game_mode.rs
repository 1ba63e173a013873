//! Game-mode lifecycle: loaded flag and game-feature activation.
//!
//! A game feature grants its ability sets to every initialized player and
//! keeps the returned handles per player; deactivating the feature revokes
//! exactly those grants.

use std::collections::BTreeMap;

use gameplay_content::{ContentBundle, GameFeatureData};
use gameplay_core::{AbilitySet, ActorId, GameplayEnv, GrantedHandles};

use crate::player::{InitState, Player};

#[derive(Debug, Default)]
struct ActiveFeature {
    name: String,
    grants: BTreeMap<ActorId, Vec<GrantedHandles>>,
}

#[derive(Debug, Default)]
pub struct GameModeLifecycle {
    loaded: bool,
    active: Vec<ActiveFeature>,
}

impl GameModeLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Game-mode data is loaded; players may start initializing.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn active_features(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|feature| feature.name.as_str())
    }

    /// Marks the mode loaded and activates its features, in authored order,
    /// for every player that finished applying its pawn data.
    ///
    /// Returns the names of the features that were activated.
    pub(crate) fn start(
        &mut self,
        content: &ContentBundle,
        players: &mut BTreeMap<ActorId, Player>,
        env: &GameplayEnv<'_>,
    ) -> Vec<String> {
        if self.loaded {
            return Vec::new();
        }
        self.loaded = true;
        tracing::info!(mode = %content.game_mode.name, "game mode loaded");

        let mut activated = Vec::new();
        for data in &content.game_mode.features {
            let mut feature = ActiveFeature {
                name: data.name.clone(),
                grants: BTreeMap::new(),
            };
            for player in players.values_mut() {
                if player.init >= InitState::DataInitialized {
                    grant_feature(&mut feature, data, content, player, env);
                }
            }
            tracing::debug!(feature = %data.name, players = feature.grants.len(), "game feature activated");
            activated.push(data.name.clone());
            self.active.push(feature);
        }
        activated
    }

    /// Grants every active feature to a player that just applied its pawn data.
    pub(crate) fn grant_to(
        &mut self,
        content: &ContentBundle,
        player: &mut Player,
        env: &GameplayEnv<'_>,
    ) {
        for feature in &mut self.active {
            let Some(data) = content
                .game_mode
                .features
                .iter()
                .find(|data| data.name == feature.name)
            else {
                continue;
            };
            if feature.grants.contains_key(&player.id) {
                continue;
            }
            grant_feature(feature, data, content, player, env);
        }
    }

    /// Forgets the grants of a player that left; its ability system is gone.
    pub(crate) fn forget(&mut self, actor: ActorId) {
        for feature in &mut self.active {
            feature.grants.remove(&actor);
        }
    }

    /// Deactivates every feature in reverse activation order and revokes its grants.
    ///
    /// Returns the names of the features that were deactivated.
    pub(crate) fn stop(
        &mut self,
        players: &mut BTreeMap<ActorId, Player>,
        env: &GameplayEnv<'_>,
    ) -> Vec<String> {
        let mut deactivated = Vec::new();
        while let Some(feature) = self.active.pop() {
            for (actor, grants) in feature.grants {
                let Some(player) = players.get_mut(&actor) else {
                    continue;
                };
                for handles in grants.into_iter().rev() {
                    AbilitySet::remove_from(handles, &mut player.server, env);
                }
            }
            tracing::debug!(feature = %feature.name, "game feature deactivated");
            deactivated.push(feature.name);
        }
        self.loaded = false;
        deactivated
    }
}

fn grant_feature(
    feature: &mut ActiveFeature,
    data: &GameFeatureData,
    content: &ContentBundle,
    player: &mut Player,
    env: &GameplayEnv<'_>,
) {
    let grants = feature.grants.entry(player.id).or_default();
    for name in &data.ability_sets {
        let Some(set) = content.ability_set(name) else {
            tracing::error!(feature = %data.name, set = %name, "game feature refers to an unknown ability set");
            continue;
        };
        if let Some(handles) = set.give_to(&mut player.server, None, env) {
            grants.push(handles);
        }
    }
}
